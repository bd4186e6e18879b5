use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::info;

pub mod config;

mod auth;
mod client;
mod error;
mod gateway;
mod manifest;
mod metrics;
mod pages;
mod state;
mod versions;


pub use gateway::router;
pub use state::GatewayState;

use crate::config::Configuration;

/// Bind the gateway (and the metrics listener, when configured) and spawn
/// them onto `tasks`.
pub async fn start(tasks: &mut JoinSet<Result<()>>, config: Configuration) -> Result<()> {
    let state = Arc::new(GatewayState::new(config).await?);

    if let Some(prometheus) = &state.config.prometheus {
        metrics::start_metrics(tasks, prometheus, state.clone())?;
    }

    let listen_addr = format!(
        "{}:{}",
        state.config.listen.address, state.config.listen.port
    );
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    info!(
        "Serving registry {} on {listen_addr}",
        state.config.registry.base_url()
    );

    let app = router(state);
    tasks.spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });

    Ok(())
}
