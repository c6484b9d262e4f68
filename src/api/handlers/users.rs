//! User management endpoints.
//!
//! The same list/create/delete handlers also serve the `/marketApp` routes.

use crate::api::{
    handlers::{bad_request, error_response, parse_id, principal::Principal},
    AppState,
};
use crate::auth::validate_password_strength;
use crate::users::{valid_email, valid_name, ListQuery, UserError, UserPage, UserSummary};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// `name:<pattern>` or `email:<pattern>`
    search: Option<String>,
    /// `<field>:<asc|desc>`
    sort: Option<String>,
    page_number: Option<usize>,
    page_size: Option<usize>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        Self {
            search: params.search,
            sort: params.sort,
            page_number: params.page_number,
            page_size: params.page_size,
        }
    }
}

#[derive(ToSchema, Deserialize)]
pub struct CreateUserRequest {
    name: String,
    email: String,
    password: String,
    password_confirm: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct UpdateUserRequest {
    name: String,
    email: String,
}

#[derive(ToSchema, Deserialize)]
pub struct ChangePasswordRequest {
    password_old: String,
    password_new: String,
    password_confirm: String,
}

impl std::fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordRequest").finish_non_exhaustive()
    }
}

pub(crate) fn user_error_response(err: UserError) -> Response {
    match err {
        UserError::NotFound => error_response(StatusCode::NOT_FOUND, "Unknown user"),
        UserError::EmailTaken => {
            error_response(StatusCode::CONFLICT, "Email is already registered")
        }
        UserError::Internal(e) => {
            error!("User operation failed: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/users",
    params(ListParams),
    responses(
        (status = 200, description = "Filtered, sorted and paged users.", body = UserPage),
        (status = 401, description = "Missing or invalid bearer token."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn list_users(
    Extension(state): Extension<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    match state.users.list(&params.into()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => user_error_response(err),
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User detail.", body = UserSummary),
        (status = 400, description = "Invalid user id."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "User not found."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn get_user(Extension(state): Extension<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.users.get(id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => user_error_response(err),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created.", body = UserSummary),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 409, description = "Email is already registered."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn create_user(
    Extension(state): Extension<AppState>,
    payload: Option<Json<CreateUserRequest>>,
) -> Response {
    let request: CreateUserRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    if !valid_name(&request.name) {
        return bad_request("Invalid name");
    }

    if !valid_email(&request.email) {
        return bad_request("Invalid email");
    }

    if let Err(reason) = validate_password_strength(&request.password) {
        return bad_request(&reason);
    }

    if request.password != request.password_confirm {
        return bad_request("Password confirmation mismatched");
    }

    match state
        .users
        .create(request.name.trim(), &request.email, &request.password)
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => user_error_response(err),
    }
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated.", body = UserSummary),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "User not found."),
        (status = 409, description = "Email is already registered."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn update_user(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    payload: Option<Json<UpdateUserRequest>>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let request: UpdateUserRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    if !valid_name(&request.name) {
        return bad_request("Invalid name");
    }

    if !valid_email(&request.email) {
        return bad_request("Invalid email");
    }

    if let Err(err) = state
        .users
        .update(id, request.name.trim(), &request.email)
        .await
    {
        return user_error_response(err);
    }

    match state.users.get(id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => user_error_response(err),
    }
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User deleted."),
        (status = 400, description = "Invalid user id."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "User not found."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn delete_user(Extension(state): Extension<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.users.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => user_error_response(err),
    }
}

#[utoipa::path(
    patch,
    path = "/users/{id}/change-password",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed."),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 403, description = "Wrong current password, or not the caller's own account."),
        (status = 404, description = "User not found."),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn change_password(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if principal.user_id != id.to_string() {
        return error_response(
            StatusCode::FORBIDDEN,
            "Only the account owner can change its password",
        );
    }

    let request: ChangePasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    match state.users.check_password(id, &request.password_old).await {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::FORBIDDEN, "Wrong password"),
        Err(err) => return user_error_response(err),
    }

    if let Err(reason) = validate_password_strength(&request.password_new) {
        return bad_request(&reason);
    }

    if request.password_new != request.password_confirm {
        return bad_request("Password confirmation mismatched");
    }

    match state.users.change_password(id, &request.password_new).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => user_error_response(err),
    }
}
