use crate::api::{handlers::bad_request, AppState};
use crate::auth::LoginResult;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Debug, PartialEq, Eq)]
pub struct LoginResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(rename = "loginMaxAttempts", skip_serializing_if = "Option::is_none")]
    login_max_attempts: Option<bool>,
    #[serde(rename = "successLogin")]
    success_login: bool,
}

impl From<LoginResult> for LoginResponse {
    fn from(result: LoginResult) -> Self {
        match result {
            LoginResult::Success {
                email,
                name,
                user_id,
                token,
            } => Self {
                email: Some(email),
                name: Some(name),
                user_id: Some(user_id),
                token: Some(token),
                login_max_attempts: None,
                success_login: true,
            },
            LoginResult::Failure { login_max_attempts } => Self {
                email: None,
                name: None,
                user_id: None,
                token: None,
                login_max_attempts: Some(login_max_attempts),
                success_login: false,
            },
        }
    }
}

#[utoipa::path(
    post,
    path= "/authentication/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful", body = LoginResponse, content_type = "application/json"),
        (status = 401, description = "Wrong email or password", body = LoginResponse),
        (status = 403, description = "Too many failed login attempts", body = LoginResponse),
    ),
    tag= "authentication"
)]
#[instrument(skip(state))]
pub async fn login(
    Extension(state): Extension<AppState>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    match state
        .guard
        .check_login_credentials(&request.email, &request.password)
        .await
    {
        Ok(result) => {
            let status = match result {
                LoginResult::Success { .. } => StatusCode::OK,
                LoginResult::Failure {
                    login_max_attempts: true,
                } => StatusCode::FORBIDDEN,
                LoginResult::Failure { .. } => StatusCode::UNAUTHORIZED,
            };

            (status, Json(LoginResponse::from(result))).into_response()
        }
        Err(e) => {
            error!("Error checking login credentials: {e:#}");

            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_body_field_names() {
        let response = LoginResponse::from(LoginResult::Success {
            email: "a@x.com".to_string(),
            name: "Ana".to_string(),
            user_id: "42".to_string(),
            token: "t".to_string(),
        });

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({
                "email": "a@x.com",
                "name": "Ana",
                "user_id": "42",
                "token": "t",
                "successLogin": true,
            })
        );
    }

    #[test]
    fn failure_body_reports_lockout() {
        let response = LoginResponse::from(LoginResult::Failure {
            login_max_attempts: true,
        });

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({ "loginMaxAttempts": true, "successLogin": false })
        );
    }
}
