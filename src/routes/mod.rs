pub mod api;

use std::error::Error;

use axum::Router;
use axum::response::{IntoResponse, Response};
use hyper::StatusCode;
use serde::Serialize;
use serde_json::json;

use crate::server::appstate::AppState;

#[derive(Debug, Serialize)]
/// Simple admin api error wrapper.
///
/// Handler results need an [`IntoResponse`] error type; wrapping the message
/// here keeps [`crate::error::ApiError`] free of any axum dependency.
struct AdminApiError(String);

type AdminApiResult<T> = Result<T, AdminApiError>;

impl<E: Error> From<E> for AdminApiError {
    fn from(value: E) -> Self {
        Self(value.to_string())
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> Response {
        log::error!("Request failed: {}", self.0);

        let res = json!({"error": self.0});

        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(res)).into_response()
    }
}

pub fn router() -> Router<AppState> {
    Router::new().nest("/api", api::router())
}
