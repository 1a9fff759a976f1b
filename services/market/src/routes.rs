//! Marketplace routes

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use crate::{
    error::MarketError,
    handlers::{auth, listings, pages},
    middleware::{error_pages, session_middleware},
    state::AppState,
};

/// Create the router for the marketplace service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/home", get(pages::index))
        .route("/about", get(pages::about))
        .route("/health", get(health_check))
        .route(
            "/registration",
            get(auth::registration_form).post(auth::register),
        )
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/profile/:username", get(auth::profile))
        .route("/feed", get(listings::feed))
        .route("/feed/:id", get(listings::show))
        .route("/product/:id", get(listings::show))
        .route("/feed/:id/delete", get(listings::delete))
        .route(
            "/feed/:id/update",
            get(listings::edit_form).post(listings::update),
        )
        .route(
            "/create_position",
            get(listings::create_form).post(listings::create),
        )
        .fallback(not_found)
        // The session layer is outermost so error pages see the current user
        .layer(from_fn_with_state(state.clone(), error_pages))
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "market"
    }))
}

async fn not_found() -> MarketError {
    MarketError::NotFound("route".to_string())
}
