//! Operator Control Plane: an Axum WebSocket hub that fans every
//! orchestrator-emitted `OperatorEvent` out to connected consoles and
//! relays their control messages (`get_call_configuration`,
//! `get_conversation_history`, `session.update`) back to the addressed
//! call's `mpsc` queue.
//!
//! Nothing here runs call logic; it only bridges `ivr-orchestrator`'s
//! per-call senders to a network-facing transport.

pub mod broadcaster;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod state;

pub use broadcaster::OperatorBroadcaster;
pub use error::HttpError;
pub use registry::CallRegistry;
pub use routes::build_router;
pub use state::{AppState, WebContext};

use std::net::SocketAddr;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

/// Binds `addr` and serves the operator control plane until the process is
/// torn down.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "operator control plane listening");
    axum::serve(listener, app).await?;
    Ok(())
}
