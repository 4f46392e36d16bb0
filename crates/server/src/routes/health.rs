use axum::{Json, extract::State};
use soulbridge_api::{CapabilitiesResponse, HealthResponse, trial};

use crate::AppConfig;

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// GET /api/capabilities — what this deployment has switched on.
pub async fn capabilities(State(config): State<AppConfig>) -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse {
        auth_enabled: !config.jwt_secret.is_empty(),
        registration_open: config.registration_open,
        trial_hours: trial::TRIAL_HOURS,
        trial_credits: trial::TRIAL_CREDITS,
    })
}
