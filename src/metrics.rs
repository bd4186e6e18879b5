use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus_client::{
    encoding::{EncodeLabelSet, text::encode},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::{config::PrometheusConfig, state::GatewayState};

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
pub(crate) struct UpstreamLabels {
    pub endpoint: String,
    pub outcome: String,
}

#[derive(Clone, Default)]
pub(crate) struct UpstreamMetrics {
    requests: Family<UpstreamLabels, Counter>,
}

impl UpstreamMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        registry.register(
            "upstream_requests",
            "Number of requests made to the upstream registry",
            metrics.requests.clone(),
        );
        metrics
    }

    pub fn observe(&self, endpoint: &str, outcome: &str) {
        self.requests
            .get_or_create(&UpstreamLabels {
                endpoint: endpoint.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }
}

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// Renders the gateway's registry in the Prometheus text format.
async fn metrics_handler(State(state): State<Arc<GatewayState>>) -> Response {
    let mut buffer = String::new();

    match encode(&mut buffer, &state.registry) {
        Ok(()) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], buffer).into_response(),
        Err(err) => {
            error!("Failed to encode metrics: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) fn metrics_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

pub(crate) fn start_metrics(
    tasks: &mut JoinSet<Result<()>>,
    config: &PrometheusConfig,
    state: Arc<GatewayState>,
) -> Result<()> {
    let app = metrics_router(state);
    let listen_addr = format!("{}:{}", config.address, config.port);

    tasks.spawn(async move {
        let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
        info!("Serving metrics on {listen_addr}");
        axum::serve(listener, app).await?;
        Ok(())
    });

    Ok(())
}
