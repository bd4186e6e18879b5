use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::state::GatewayState;

pub(crate) async fn get(State(state): State<Arc<GatewayState>>) -> Response {
    Html(state.pages.index.clone()).into_response()
}
