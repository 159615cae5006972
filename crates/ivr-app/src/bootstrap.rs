//! Composition root. The only place that instantiates concrete adapters
//! and wires them against `ivr-core`'s ports.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use ivr_ari::{AriClient, AriConfig, AriEventReader, ExternalMediaReader};
use ivr_core::{AppEventEmitter, BatchFallback, Call, CallId, RecognizerSessionFactory};
use ivr_orchestrator::{CallMessage, CallOrchestrator};
use ivr_recognizers::{
    GoogleSpeechConfig, GoogleSpeechFactory, OpenAiRealtimeConfig, OpenAiRealtimeFactory,
    WhisperBatchFallback,
};
use ivr_web::{CallRegistry, OperatorBroadcaster, WebContext};

use crate::config::{AppConfig, RecognizerBackendConfig};

pub struct AppContext {
    pub registry: Arc<CallRegistry>,
    pub broadcaster: Arc<OperatorBroadcaster>,
    pub recognizer_factory: Arc<dyn RecognizerSessionFactory>,
    pub batch_fallback: Arc<dyn BatchFallback>,
    pub config: AppConfig,
}

pub fn bootstrap(config: AppConfig, speech_credentials: String) -> AppContext {
    let recognizer_factory: Arc<dyn RecognizerSessionFactory> = match &config.recognizer {
        RecognizerBackendConfig::GoogleSpeech { endpoint } => {
            Arc::new(GoogleSpeechFactory::new(GoogleSpeechConfig {
                endpoint: endpoint.clone(),
                api_key: speech_credentials.clone(),
            }))
        }
        RecognizerBackendConfig::OpenaiRealtime { ws_url } => {
            Arc::new(OpenAiRealtimeFactory::new(OpenAiRealtimeConfig {
                ws_url: ws_url.clone(),
                api_key: speech_credentials.clone(),
            }))
        }
    };
    let batch_fallback: Arc<dyn BatchFallback> =
        Arc::new(WhisperBatchFallback::new(speech_credentials));

    AppContext {
        registry: Arc::new(CallRegistry::new()),
        broadcaster: Arc::new(OperatorBroadcaster::with_defaults()),
        recognizer_factory,
        batch_fallback,
        config,
    }
}

/// Runs the operator control plane and the ARI event loop concurrently
/// until either stops.
pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let web_state: ivr_web::AppState = Arc::new(WebContext::new(
        ctx.registry.clone(),
        ctx.broadcaster.clone(),
    ));
    let bind_addr = ctx.config.operator_bind_addr;

    let web = tokio::spawn(async move { ivr_web::serve(bind_addr, web_state).await });
    let ari = tokio::spawn(run_ari_loop(ctx));

    tokio::select! {
        result = web => { result??; }
        result = ari => { result??; }
    }
    Ok(())
}

async fn run_ari_loop(ctx: Arc<AppContext>) -> Result<()> {
    let mut reader = AriEventReader::connect(&ctx.config.ari.events_ws_url).await?;
    info!(url = %ctx.config.ari.events_ws_url, "connected to ARI events");

    while let Some((channel_id, event)) = reader.next_event().await {
        if let Some(tx) = ctx.registry.get(&channel_id) {
            let _ = tx.send(CallMessage::Ari(event));
            continue;
        }
        if matches!(event, ivr_core::AriEvent::StasisStart) {
            spawn_call(&ctx, channel_id);
        } else {
            warn!(channel_id, "ARI event for unknown call, dropping");
        }
    }
    Ok(())
}

fn spawn_call(ctx: &Arc<AppContext>, channel_id: CallId) {
    let ari_config = AriConfig {
        base_url: ctx.config.ari.base_url.clone(),
        app_name: ctx.config.ari.app_name.clone(),
        username: ctx.config.ari.username.clone(),
        password: ctx.config.ari.password.clone(),
        channel_id: channel_id.clone(),
    };
    let actions: Box<dyn ivr_core::TelephonyActions> = Box::new(AriClient::new(ari_config));

    let call = Call::new(channel_id.clone(), None, ctx.config.default_call_config.clone());
    let emitter: Arc<dyn AppEventEmitter> = ctx.broadcaster.clone();

    let (orchestrator, tx) = CallOrchestrator::new(
        call,
        actions,
        ctx.recognizer_factory.clone(),
        ctx.batch_fallback.clone(),
        emitter,
    );

    ctx.registry.register(channel_id.clone(), tx.clone());
    spawn_external_media_reader(ctx, channel_id.clone(), tx);

    let registry = ctx.registry.clone();
    tokio::spawn(async move {
        let outcome = orchestrator.run().await;
        info!(call_id = %channel_id, ?outcome, "call finished");
        registry.deregister(&channel_id);
    });
}

fn spawn_external_media_reader(
    ctx: &Arc<AppContext>,
    channel_id: CallId,
    tx: tokio::sync::mpsc::UnboundedSender<CallMessage>,
) {
    let url = ctx
        .config
        .ari
        .external_media_url_template
        .replace("{channel_id}", &channel_id);
    tokio::spawn(async move {
        let mut reader = match ExternalMediaReader::connect(&url).await {
            Ok(reader) => reader,
            Err(err) => {
                warn!(call_id = %channel_id, %err, "failed to open external-media socket");
                return;
            }
        };
        while let Some(frame) = reader.next_frame().await {
            if tx.send(CallMessage::AudioFrame(frame)).is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_media_url_substitutes_channel_id() {
        let template = "ws://localhost:9000/media/{channel_id}";
        let resolved = template.replace("{channel_id}", "chan-42");
        assert_eq!(resolved, "ws://localhost:9000/media/chan-42");
    }
}
