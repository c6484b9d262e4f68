use crate::api::{
    handlers::{bad_request, error_response, parse_id},
    AppState,
};
use crate::market::{items, CartError, CartItem, Item};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    item_id: String,
    quantity: i32,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    new_quantity: i32,
}

#[derive(ToSchema, Serialize, Debug, PartialEq)]
pub struct ItemResponse {
    id: String,
    name: String,
    price: f64,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.to_string(),
            price: item.price,
        }
    }
}

fn cart_error_response(err: CartError) -> Response {
    match err {
        CartError::UserNotFound => error_response(StatusCode::NOT_FOUND, "Unknown user"),
        CartError::ItemNotFound => error_response(StatusCode::NOT_FOUND, "Unknown item"),
        CartError::LineNotFound => error_response(StatusCode::NOT_FOUND, "Unknown cart entry"),
        CartError::InvalidQuantity => bad_request("Quantity must be at least 1"),
        CartError::Internal(e) => {
            error!("Cart operation failed: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/marketApp/items",
    responses(
        (status = 200, description = "Items for sale.", body = [ItemResponse]),
        (status = 401, description = "Missing or invalid bearer token."),
    ),
    security(("bearer" = [])),
    tag = "market"
)]
pub async fn items_for_sale() -> Json<Vec<ItemResponse>> {
    Json(items().iter().map(ItemResponse::from).collect())
}

#[utoipa::path(
    get,
    path = "/marketApp/{id}/cart",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "The user's cart.", body = [CartItem]),
        (status = 400, description = "Invalid user id."),
        (status = 401, description = "Missing or invalid bearer token."),
    ),
    security(("bearer" = [])),
    tag = "market"
)]
#[instrument(skip(state))]
pub async fn get_cart(Extension(state): Extension<AppState>, Path(id): Path<String>) -> Response {
    let user_id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.market.get_cart(user_id).await {
        Ok(cart) => (StatusCode::OK, Json(cart)).into_response(),
        Err(err) => cart_error_response(err),
    }
}

#[utoipa::path(
    post,
    path = "/marketApp/{id}/cart",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Item added, returns the whole cart.", body = [CartItem]),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "Unknown user or item."),
    ),
    security(("bearer" = [])),
    tag = "market"
)]
#[instrument(skip(state))]
pub async fn add_to_cart(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    payload: Option<Json<AddToCartRequest>>,
) -> Response {
    let user_id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let request: AddToCartRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    match state
        .market
        .add_to_cart(user_id, request.item_id.trim(), request.quantity)
        .await
    {
        Ok(cart) => (StatusCode::CREATED, Json(cart)).into_response(),
        Err(err) => cart_error_response(err),
    }
}

#[utoipa::path(
    put,
    path = "/marketApp/{id}/cart",
    params(
        ("id" = String, Path, description = "Cart entry id")
    ),
    request_body = UpdateCartRequest,
    responses(
        (status = 204, description = "Quantity updated."),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "Unknown cart entry."),
    ),
    security(("bearer" = [])),
    tag = "market"
)]
#[instrument(skip(state))]
pub async fn update_cart(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    payload: Option<Json<UpdateCartRequest>>,
) -> Response {
    let line_id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let request: UpdateCartRequest = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("Missing payload"),
    };

    match state.market.update_cart(line_id, request.new_quantity).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => cart_error_response(err),
    }
}

#[utoipa::path(
    delete,
    path = "/marketApp/{id}/cart",
    params(
        ("id" = String, Path, description = "Cart entry id")
    ),
    responses(
        (status = 204, description = "Entry removed."),
        (status = 400, description = "Invalid cart entry id."),
        (status = 401, description = "Missing or invalid bearer token."),
        (status = 404, description = "Unknown cart entry."),
    ),
    security(("bearer" = [])),
    tag = "market"
)]
#[instrument(skip(state))]
pub async fn remove_from_cart(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Response {
    let line_id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.market.remove_from_cart(line_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => cart_error_response(err),
    }
}
