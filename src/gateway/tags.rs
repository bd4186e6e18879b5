use axum::response::Response;

use crate::{error::GatewayError, state::GatewayState, versions::sort_versions};

/// Newest versions first, followed by tags that don't look like versions.
pub(crate) async fn get(
    state: &GatewayState,
    repository: &str,
) -> Result<Response, GatewayError> {
    let tags = match state.client.list_tags(repository).await? {
        Some(tags) => tags,
        None => return Err(GatewayError::NotFound {}),
    };

    let mut tags = sort_versions(&tags);
    tags.reverse();

    super::json_response(&tags)
}
