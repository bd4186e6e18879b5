use std::sync::Arc;

use axum::{extract::State, response::Response};

use crate::{error::GatewayError, state::GatewayState};

/// Repository names exactly as the catalog lists them. A catalog without a
/// `repositories` field is reported as `null`.
pub(crate) async fn get(
    State(state): State<Arc<GatewayState>>,
) -> Result<Response, GatewayError> {
    let repositories = state.client.list_repositories().await?;
    super::json_response(&repositories)
}
