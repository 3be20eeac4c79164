use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error body returned by every endpoint on failure.
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub code: String,
}

pub fn success<T>(body: T) -> Response
where
    T: Serialize,
{
    (StatusCode::OK, Json(body)).into_response()
}

pub fn created<T>(body: T) -> Response
where
    T: Serialize,
{
    (StatusCode::CREATED, Json(body)).into_response()
}

pub fn empty_success() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub fn error(code: &str, message: impl Into<String>, status: StatusCode) -> Response {
    let body = ApiErrorResponse {
        error: message.into(),
        code: code.to_string(),
    };

    (status, Json(body)).into_response()
}
