use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Basic};
use tracing::info;

use crate::state::GatewayState;

const REALM: &str = "Please Authenticate to View";

fn challenge() -> Response {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::UNAUTHORIZED.into_response())
}

/// Guards every route with HTTP basic authentication when credentials are
/// configured. Without an `authentication` section requests pass through.
pub(crate) async fn require_basic_auth(
    State(state): State<Arc<GatewayState>>,
    header: Option<TypedHeader<Authorization<Basic>>>,
    request: Request,
    next: Next,
) -> Response {
    let config = match &state.config.authentication {
        Some(config) => config,
        None => return next.run(request).await,
    };

    match header {
        Some(TypedHeader(Authorization(basic)))
            if basic.username() == config.username && basic.password() == config.password =>
        {
            next.run(request).await
        }
        Some(TypedHeader(Authorization(basic))) => {
            info!("Rejected credentials for user \"{}\"", basic.username());
            challenge()
        }
        None => challenge(),
    }
}
