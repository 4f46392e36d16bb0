use axum::{
    Json,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Map, Value, json};

const DOCS_MD: &str = include_str!("../../../../docs.md");

/// `(method, path, summary, requires auth)` for every public route.
const ROUTES: &[(&str, &str, &str, bool)] = &[
    ("get", "/api/health", "Liveness check", false),
    ("get", "/api/capabilities", "Enabled features", false),
    ("get", "/api/tiers", "Plan table and credit costs", false),
    ("post", "/api/register", "Create an account", false),
    ("post", "/api/login", "Log in with email and password", false),
    ("post", "/api/refresh", "Rotate a refresh token", false),
    ("post", "/api/logout", "Revoke a refresh token", false),
    ("put", "/api/password", "Change password", true),
    ("get", "/api/me", "Profile", true),
    ("get", "/v1/me", "Profile", true),
    ("get", "/api/entitlements", "Plan, access, quotas, and wallet", true),
    ("get", "/v1/entitlements", "Plan, access, quotas, and wallet", true),
    ("get", "/api/usage", "Today's usage counters", true),
    ("post", "/api/usage/{feature}", "Consume one use of a limited feature", true),
    ("get", "/api/credits", "Wallet and recent ledger", true),
    ("post", "/api/credits/spend", "Spend credits on a premium feature", true),
    ("get", "/api/trial", "Trial status", true),
    ("post", "/api/trial/start", "Start the five-hour trial", true),
    ("get", "/api/referrals", "Referral code and progress", true),
    ("post", "/api/referrals/claim", "Claim a referral code", true),
    ("get", "/api/companions", "Companion catalog", true),
    ("post", "/api/companions/select", "Select a companion", true),
    ("post", "/api/chat", "Talk to a companion", true),
    ("get", "/api/chat/history", "Chat history", true),
    ("delete", "/api/chat/history", "Clear chat history", true),
    ("get", "/api/horoscope/{sign}", "Daily horoscope", true),
    ("post", "/api/tarot", "Daily tarot spread", true),
    ("get", "/api/library", "Saved songs", true),
    ("post", "/api/library", "Save a song", true),
    ("delete", "/api/library/{id}", "Delete a song", true),
    ("put", "/api/admin/users/{id}/plan", "Set a user's plan (admin key)", false),
    ("post", "/api/admin/users/{id}/credits", "Grant purchased credits (admin key)", false),
];

/// GET /docs — markdown API reference.
pub async fn handle() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        DOCS_MD,
    )
}

fn openapi_document() -> Value {
    let mut paths = Map::new();
    for (method, path, summary, auth) in ROUTES {
        let mut op = json!({
            "summary": summary,
            "responses": { "200": { "description": "OK" } },
        });
        if *auth {
            op["security"] = json!([{ "bearerAuth": [] }]);
        }
        let entry = paths
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        entry[*method] = op;
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "SoulBridge AI API",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": paths,
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            }
        }
    })
}

/// GET /openapi.json
pub async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        for (method, path, _, _) in ROUTES {
            let line = format!("{} {path}", method.to_uppercase());
            assert!(DOCS_MD.contains(&line), "docs.md is missing `{line}`");
        }
    }

    #[test]
    fn test_openapi_merges_methods_per_path() {
        let doc = openapi_document();
        let history = &doc["paths"]["/api/chat/history"];
        assert!(history.get("get").is_some());
        assert!(history.get("delete").is_some());
        assert!(doc["paths"]["/api/health"]["get"].get("security").is_none());
    }
}
