use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::debug;

use super::route::ContainerRoute;
use crate::{error::GatewayError, state::GatewayState};

pub(crate) async fn get(
    Path(path): Path<String>,
    State(state): State<Arc<GatewayState>>,
) -> Result<Response, GatewayError> {
    match ContainerRoute::parse(&path) {
        Some(ContainerRoute::Tags { repository }) => super::tags::get(&state, &repository).await,
        Some(ContainerRoute::Manifest {
            repository,
            reference,
        }) => super::manifest::get(&state, &repository, &reference).await,
        None => {
            debug!("No container route matches {path:?}");
            Err(GatewayError::NotFound {})
        }
    }
}
