use actix_web::{web, HttpResponse};

use crate::core::SearchError;
use crate::models::{HealthResponse, InitializeResponse};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/initialize", web::post().to(initialize));
}

/// Health check endpoint; 503 while either store is unreachable
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = state.engine.health_check().await;
    let (mut builder, status) = if healthy {
        (HttpResponse::Ok(), "healthy")
    } else {
        tracing::warn!("Health check degraded");
        (HttpResponse::ServiceUnavailable(), "degraded")
    };

    builder.json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Drop both catalogs and the cache
///
/// POST /api/v1/initialize
async fn initialize(state: web::Data<AppState>) -> Result<HttpResponse, SearchError> {
    state.engine.reset().await?;
    tracing::info!("Service initialized");

    Ok(HttpResponse::Ok().json(InitializeResponse {
        status: "ok".to_string(),
    }))
}
