use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Failures surfaced to the HTTP layer.
///
/// Only the two upstream "not here" signals become a 404, everything else is
/// reported as a generic server error. Neither variant carries a body, the
/// error page layer renders one.
#[derive(Debug)]
pub(crate) enum GatewayError {
    NotFound {},
    UpstreamUnavailable(anyhow::Error),
}

fn format_error(e: &anyhow::Error) -> String {
    let mut s = String::new();
    s.push_str(&format!("{}", e));
    for cause in e.chain().skip(1) {
        s.push_str(&format!("\nCaused by: {}", cause));
    }
    s
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound {} => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Body::empty()),
            Self::UpstreamUnavailable(err) => {
                error!(
                    error = %format_error(&err),
                    backtrace = ?err.backtrace(),
                    "Upstream registry error"
                );
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::empty())
            }
        }
        .unwrap_or_else(|err| {
            let err = err.into();
            error!(
                error = %format_error(&err),
                "Failed to build error response"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Body::empty()).into_response()
        })
    }
}

impl<E> From<E> for GatewayError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::UpstreamUnavailable(err.into())
    }
}
