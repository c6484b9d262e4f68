#![allow(clippy::needless_for_each)]

use crate::{
    api::handlers::{health, login, market, principal, users},
    auth::{JwtIssuer, LoginGuard},
    market::MarketService,
    users::UsersService,
};
use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{delete, get, patch, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;

/// Everything the handlers need, shared across requests.
#[derive(Clone, Debug)]
pub struct AppState {
    pub guard: Arc<LoginGuard>,
    pub users: UsersService,
    pub market: MarketService,
    pub tokens: Arc<JwtIssuer>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        login::login,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::change_password,
        market::add_to_cart,
        market::update_cart,
        market::remove_from_cart,
        market::get_cart,
        market::items_for_sale,
    ),
    components(schemas(
        health::Health,
        login::LoginRequest,
        login::LoginResponse,
        users::CreateUserRequest,
        users::UpdateUserRequest,
        users::ChangePasswordRequest,
        crate::users::UserSummary,
        crate::users::UserPage,
        market::AddToCartRequest,
        market::UpdateCartRequest,
        market::ItemResponse,
        crate::market::CartItem,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "marketapp", description = "Market app API")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_origin(Any);

    let protected = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/change-password", patch(users::change_password))
        .route("/marketApp", get(users::list_users).post(users::create_user))
        .route("/marketApp/items", get(market::items_for_sale))
        .route("/marketApp/:id", delete(users::delete_user))
        .route(
            "/marketApp/:id/cart",
            get(market::get_cart)
                .post(market::add_to_cart)
                .put(market::update_cart)
                .delete(market::remove_from_cart),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            principal::require_bearer,
        ));

    Router::new()
        .route("/", get(|| async { "🛒" }))
        .route("/authentication/login", post(login::login))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state)),
        )
        .route("/health", get(health::health).options(health::health))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
