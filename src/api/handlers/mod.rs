pub mod health;
pub mod login;
pub mod market;
pub mod principal;
pub mod users;

// common functions for the handlers
use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use uuid::Uuid;

/// Parse a path id, answering 400 when it is not a UUID.
#[allow(clippy::result_large_err)]
pub fn parse_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id.trim()).map_err(|_| bad_request("Invalid id"))
}

pub fn bad_request(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}
