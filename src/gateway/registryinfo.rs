use std::sync::Arc;

use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::{config::Protocol, error::GatewayError, state::GatewayState};

#[derive(Debug, Serialize)]
struct RegistryInfo<'a> {
    host: &'a str,
    port: String,
    protocol: Protocol,
    ssl_verify: bool,
}

/// Reports which registry this gateway is pointed at. Never calls upstream.
pub(crate) async fn get(
    State(state): State<Arc<GatewayState>>,
) -> Result<Response, GatewayError> {
    let registry = &state.config.registry;

    super::json_response(&RegistryInfo {
        host: &registry.host,
        port: registry.port.to_string(),
        protocol: registry.protocol,
        ssl_verify: registry.ssl_verify,
    })
}
