//! In-process test harness: a fresh SQLite data dir per app, requests driven
//! through the router with `oneshot`.

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

use soulbridge_server::{AppConfig, AppState, build_router, storage};

pub const ADMIN_KEY: &str = "test-admin-key";
pub const PASSWORD: &str = "correct horse battery";

pub fn test_config() -> AppConfig {
    AppConfig {
        base_url: "https://soulbridge.test".into(),
        jwt_secret: "test-jwt-secret".into(),
        admin_key: ADMIN_KEY.into(),
        registration_open: true,
        cache_ttl: Duration::from_secs(300),
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    _dir: TempDir,
}

/// A registered user: bearer token plus id.
pub struct User {
    pub token: String,
    pub refresh_token: String,
    pub id: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = storage::init_db(dir.path()).unwrap();
        let state = AppState::new(db, config);
        let router = build_router(state.clone());
        Self {
            state,
            router,
            _dir: dir,
        }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        extra_header: Option<(&str, &str)>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some((name, value)) = extra_header {
            builder = builder.header(name, value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Some(token), None, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(token), Some(body), None).await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            method,
            uri,
            None,
            Some(body),
            Some(("X-SoulBridge-Admin-Key", ADMIN_KEY)),
        )
        .await
    }

    pub async fn try_register(
        &self,
        email: &str,
        referral_code: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut body = json!({
            "email": email,
            "password": PASSWORD,
            "nickname": email.split('@').next().unwrap_or("user"),
        });
        if let Some(code) = referral_code {
            body["referral_code"] = json!(code);
        }
        self.send("POST", "/api/register", None, Some(body), None).await
    }

    pub async fn register(&self, email: &str) -> User {
        self.register_with(email, None).await
    }

    pub async fn register_with(&self, email: &str, referral_code: Option<&str>) -> User {
        let (status, body) = self.try_register(email, referral_code).await;
        assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
        User {
            token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
            id: body["user_id"].as_str().unwrap().to_string(),
        }
    }

    pub async fn set_plan(&self, user: &User, plan: &str) -> Value {
        let (status, body) = self
            .admin(
                "PUT",
                &format!("/api/admin/users/{}/plan", user.id),
                json!({ "plan": plan }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "set plan: {body}");
        body
    }

    /// Run raw SQL against the app database (for moving timestamps).
    pub fn sql(&self, sql: &str, user_id: &str) {
        self.state.db.conn().execute(sql, [user_id]).unwrap();
    }
}
