//! Bearer-token authentication for protected routes.

use crate::api::{handlers::error_response, AppState};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Identity behind a validated session token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
}

/// Reject requests without a valid `Authorization: Bearer <token>` header and
/// attach the [`Principal`] to the request otherwise.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return error_response(StatusCode::UNAUTHORIZED, "Missing bearer token");
    };

    match state.tokens.validate(token) {
        Ok(claims) => {
            request.extensions_mut().insert(Principal {
                user_id: claims.sub,
                email: claims.email,
            });
            next.run(request).await
        }
        Err(e) => {
            debug!("Rejected token: {e:#}");
            error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token")
        }
    }
}
