//! HTTP API exposed to the browser page.
//!
//! Three routes drive the page's whole surface:
//! - `POST /api/ask` submits a question and returns its outcome
//! - `GET /api/result` returns the latest committed outcome (page re-renders)
//! - `GET /api/health` liveness check

mod routes;
mod state;
mod types;

pub use routes::router;
pub use state::{AppState, ResultSlot};
pub use types::{AskRequest, AskResponse, HealthResponse};

use std::sync::Arc;

use tracing::info;

use crate::agent::Agent;
use crate::config::Config;

/// Start the HTTP server and serve until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState {
        agent: Agent::new(&config),
        results: ResultSlot::default(),
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
