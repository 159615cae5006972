fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Proto compilation needs protoc on PATH. Skip gracefully rather than
    // failing the whole workspace build when it isn't installed.
    println!("cargo:rerun-if-changed=proto/speech.proto");

    let proto_path = "proto/speech.proto";
    if std::path::Path::new(proto_path).exists() {
        match tonic_prost_build::configure()
            .build_server(false)
            .build_client(true)
            .compile_protos(&[proto_path], &["proto"])
        {
            Ok(()) => println!("cargo:warning=speech proto compilation successful"),
            Err(e) => {
                println!("cargo:warning=speech proto compilation skipped: {e}");
                println!("cargo:warning=install protoc to enable the Google Speech adapter");
            }
        }
    }

    Ok(())
}
