use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderName, StatusCode, header},
    middleware,
    response::Response,
    routing::get,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{auth, error::GatewayError, pages, state::GatewayState};

mod container;
mod containers;
mod manifest;
mod registryinfo;
mod root;
mod route;
mod tags;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub(crate) fn json_response<T: Serialize>(value: &T) -> Result<Response, GatewayError> {
    let body = serde_json::to_vec(value)?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?)
}

fn cors(state: &GatewayState) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_credentials(true)
        .expose_headers([header::CONTENT_TYPE])
        .max_age(state.config.cors.max_age)
}

pub fn router(state: Arc<GatewayState>) -> Router {
    let router = Router::new()
        .route("/", get(root::get))
        .route("/containers.json", get(containers::get))
        .route("/container/{*path}", get(container::get))
        .route("/registryinfo", get(registryinfo::get))
        .fallback_service(ServeDir::new(&state.config.public))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ))
        .layer(middleware::map_response_with_state(
            state.clone(),
            pages::render_error_pages,
        ));

    let router = match state.config.cors.enabled {
        true => router.layer(cors(&state)),
        false => router,
    };

    router
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
        .with_state(state)
}
