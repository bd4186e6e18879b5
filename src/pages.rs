use std::{path::Path, sync::Arc};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use tracing::{debug, warn};

use crate::state::GatewayState;

const DEFAULT_INDEX: &str = "<!DOCTYPE html>\n<html><head><title>Registry</title></head>\
<body><h1>Registry</h1><p>See <a href=\"/containers.json\">/containers.json</a>.</p></body></html>\n";

const DEFAULT_NOT_FOUND: &str = "<!DOCTYPE html>\n<html><head><title>Not Found</title></head>\
<body><h1>404 Not Found</h1></body></html>\n";

const DEFAULT_SERVER_ERROR: &str = "<!DOCTYPE html>\n<html><head><title>Error</title></head>\
<body><h1>500 Internal Server Error</h1></body></html>\n";

/// The HTML documents served for `/` and for error responses.
#[derive(Clone, Debug)]
pub(crate) struct Pages {
    pub index: String,
    pub not_found: String,
    pub server_error: String,
}

async fn load_page(dir: &Path, name: &str, fallback: &str) -> String {
    let path = dir.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => page,
        Err(err) => {
            debug!("Using built-in {name}: {path:?}: {err}");
            fallback.to_string()
        }
    }
}

impl Pages {
    pub async fn load(dir: &Path) -> Pages {
        if !dir.is_dir() {
            warn!("Public directory {dir:?} does not exist, using built-in pages");
        }

        Pages {
            index: load_page(dir, "index.html", DEFAULT_INDEX).await,
            not_found: load_page(dir, "404.html", DEFAULT_NOT_FOUND).await,
            server_error: load_page(dir, "500.html", DEFAULT_SERVER_ERROR).await,
        }
    }
}

/// Gives bodiless 404 and 5xx responses the matching HTML page.
pub(crate) async fn render_error_pages(
    State(state): State<Arc<GatewayState>>,
    response: Response,
) -> Response {
    if response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }

    let page = match response.status() {
        StatusCode::NOT_FOUND => &state.pages.not_found,
        status if status.is_server_error() => &state.pages.server_error,
        _ => return response,
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    Response::from_parts(parts, Body::from(page.clone()))
}
