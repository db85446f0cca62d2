pub mod auth;
pub mod error;
pub mod rate_limit;
pub mod recipes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::AppState;

pub use error::{ApiError, ErrorCode, ErrorResponse};
pub use recipes::GenerateRecipeRequest;

pub fn create_router(state: Arc<AppState>) -> Result<Router> {
    let cors = cors_layer(&state.config)?;

    // Session gateway (public, cookie based)
    let auth_routes = Router::new()
        .route("/google", get(auth::begin_login))
        .route("/google/callback", get(auth::callback))
        .route("/user", get(auth::current_user))
        .route("/logout", get(auth::logout));

    let api_routes = Router::new().route("/generate-recipe", post(recipes::generate_recipe));

    Ok(Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        // One budget per client across every route
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Browser access is limited to the configured client origin, with credentials
pub fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(config.client.url.trim_end_matches('/'))
        .with_context(|| format!("Invalid client URL for CORS: {}", config.client.url))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}
