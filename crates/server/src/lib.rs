//! SoulBridge AI HTTP server: Axum routes over a single SQLite connection.

pub mod account;
pub mod cache;
pub mod error;
pub mod responder;
pub mod routes;
pub mod storage;

use axum::{
    Router,
    extract::FromRef,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use soulbridge_api::EntitlementsResponse;

use cache::TtlCache;
use responder::{PersonaResponder, Responder};
use storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub caches: Caches,
    pub responder: Arc<dyn Responder>,
}

impl AppState {
    /// State with fresh caches and the built-in persona responder.
    pub fn new(db: Db, config: AppConfig) -> Self {
        let caches = Caches::new(config.cache_ttl);
        Self {
            db,
            config,
            caches,
            responder: Arc::new(PersonaResponder),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub jwt_secret: String,
    pub admin_key: String,
    pub registration_open: bool,
    pub cache_ttl: Duration,
}

const DEFAULT_CACHE_TTL_SECS: u64 = 300;

impl AppConfig {
    pub fn from_env() -> Self {
        let base_url = env_nonempty("BASE_URL")
            .or_else(|| env_nonempty("SOULBRIDGE_BASE_URL"))
            .unwrap_or_else(|| "http://localhost:3000".into());

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() {
            tracing::warn!("JWT_SECRET not set, authenticated routes will reject every request");
        }

        let admin_key = std::env::var("SOULBRIDGE_ADMIN_KEY").unwrap_or_default();
        if admin_key.trim().is_empty() {
            tracing::info!("SOULBRIDGE_ADMIN_KEY not set, admin routes disabled");
        }

        let registration_open = std::env::var("SOULBRIDGE_REGISTRATION")
            .map(|v| v.trim() != "closed")
            .unwrap_or(true);

        let cache_ttl_secs = match env_nonempty("SOULBRIDGE_CACHE_TTL_SECS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("invalid SOULBRIDGE_CACHE_TTL_SECS={raw}, using default");
                DEFAULT_CACHE_TTL_SECS
            }),
            None => DEFAULT_CACHE_TTL_SECS,
        };

        Self {
            base_url,
            jwt_secret,
            admin_key,
            registration_open,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Generated readings and per-user entitlement snapshots.
#[derive(Clone)]
pub struct Caches {
    pub readings: Arc<TtlCache<serde_json::Value>>,
    pub entitlements: Arc<TtlCache<EntitlementsResponse>>,
}

impl Caches {
    pub fn new(ttl: Duration) -> Self {
        Self {
            readings: Arc::new(TtlCache::new(ttl)),
            entitlements: Arc::new(TtlCache::new(ttl)),
        }
    }

    /// Forget everything derived from a user's plan, wallet, or usage.
    pub fn forget_user(&self, user_id: &str) {
        self.entitlements.invalidate_prefix(&format!("{user_id}:"));
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Caches {
    fn from_ref(state: &AppState) -> Self {
        state.caches.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Responder> {
    fn from_ref(state: &AppState) -> Self {
        state.responder.clone()
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Health
        .route("/health", get(routes::health::health))
        .route("/capabilities", get(routes::health::capabilities))
        .route("/tiers", get(routes::profile::tiers))
        // Auth
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout))
        .route("/password", put(routes::auth::change_password))
        // Profile
        .route("/me", get(routes::profile::me))
        .route("/entitlements", get(routes::profile::entitlements))
        // Quotas and credits
        .route("/usage", get(routes::usage::today))
        .route("/usage/{feature}", post(routes::usage::consume))
        .route("/credits", get(routes::credits::summary))
        .route("/credits/spend", post(routes::credits::spend))
        .route("/trial", get(routes::trial::status))
        .route("/trial/start", post(routes::trial::start))
        // Referrals
        .route("/referrals", get(routes::referrals::stats))
        .route("/referrals/claim", post(routes::referrals::claim))
        // Companions
        .route("/companions", get(routes::companions::list))
        .route("/companions/select", post(routes::companions::select))
        .route("/chat", post(routes::chat::send))
        .route(
            "/chat/history",
            get(routes::chat::history).delete(routes::chat::clear_history),
        )
        // Readings
        .route("/horoscope/{sign}", get(routes::oracle::horoscope))
        .route("/tarot", post(routes::oracle::tarot))
        // Library
        .route(
            "/library",
            get(routes::library::list).post(routes::library::create),
        )
        .route("/library/{id}", delete(routes::library::remove))
        // Admin
        .route("/admin/users/{id}/plan", put(routes::admin::set_plan))
        .route(
            "/admin/users/{id}/credits",
            post(routes::admin::grant_credits),
        );

    let v1 = Router::new()
        .route("/me", get(routes::profile::me))
        .route("/entitlements", get(routes::profile::entitlements));

    Router::new()
        .nest("/api", api)
        .nest("/v1", v1)
        .route("/docs", get(routes::docs::handle))
        .route("/openapi.json", get(routes::docs::openapi))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
