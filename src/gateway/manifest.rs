use axum::response::Response;
use tracing::debug;

use crate::{error::GatewayError, manifest::enrich_manifest, state::GatewayState};

pub(crate) async fn get(
    state: &GatewayState,
    repository: &str,
    reference: &str,
) -> Result<Response, GatewayError> {
    let manifest = state.client.get_manifest(repository, reference).await?;

    // Checked before enriching: an error document has no history to decode.
    if manifest.contains_key("errors") {
        debug!("Registry reported errors for {repository}:{reference}");
        return Err(GatewayError::NotFound {});
    }

    if !manifest.contains_key("fsLayers") {
        debug!("Not an image manifest: {repository}:{reference}");
        return Err(GatewayError::NotFound {});
    }

    let manifest = enrich_manifest(manifest)?;

    super::json_response(&manifest)
}
