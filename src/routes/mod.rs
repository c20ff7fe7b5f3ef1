//! HTTP surface. Admin routes other than login sit behind bearer-token auth.

pub mod admin;
pub mod public;
pub mod webhooks;

use axum::{
    extract::FromRequest,
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::require_admin;
use crate::error::AppError;
use crate::state::AppState;

/// JSON body whose rejections render as `{"error": ...}` like every other failure
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(public_routes())
        .route("/api/webhooks/stripe", post(webhooks::stripe))
        .merge(admin_routes(state.clone()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health))
        .route("/api/vehicles", get(public::list_vehicles))
        .route("/api/vehicles/:slug", get(public::vehicle))
        .route("/api/availability", get(public::availability))
        .route("/api/return-options", get(public::return_options))
        .route("/api/settings", get(public::settings))
        .route("/api/checkout", post(public::checkout))
        .route("/api/contact", post(public::contact))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/admin/auth", get(admin::check).delete(admin::logout))
        .route("/api/admin/bookings", get(admin::list_bookings))
        .route("/api/admin/bookings/approve", post(admin::approve_booking))
        .route("/api/admin/bookings/reject", post(admin::reject_booking))
        .route(
            "/api/admin/blocked",
            get(admin::list_blocked)
                .post(admin::create_blocked)
                .delete(admin::delete_blocked),
        )
        .route("/api/admin/pricing", get(admin::list_pricing).post(admin::update_pricing))
        .route("/api/admin/settings", put(admin::put_setting))
        .route_layer(from_fn_with_state(state, require_admin));

    // Login is the only admin route reachable without a token
    Router::new()
        .route("/api/admin/auth", post(admin::login))
        .merge(protected)
}
