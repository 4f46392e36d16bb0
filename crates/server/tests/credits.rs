mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::TestApp;

fn ledger_reasons(body: &Value) -> Vec<String> {
    body["ledger"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["reason"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_bronze_cannot_spend_and_has_no_allowance() {
    let app = TestApp::new();
    let user = app.register("bronze@example.com").await;

    let (status, body) = app.get("/api/credits", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wallet"]["total"], 0);
    assert!(body["next_reset_at"].is_null());

    let (status, body) = app
        .post("/api/credits/spend", &user.token, json!({ "feature": "ai_images" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "ai_images requires the silver plan");

    let (status, _) = app
        .post("/api/credits/spend", &user.token, json!({ "feature": "teleportation" }))
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_paid_plan_spends_and_ledgers() {
    let app = TestApp::new();
    let user = app.register("silver@example.com").await;

    let body = app.set_plan(&user, "silver").await;
    assert_eq!(body["plan"], "silver");
    assert_eq!(body["wallet"]["monthly"], 200);

    // Mini studio is Gold-only.
    let (status, _) = app
        .post("/api/credits/spend", &user.token, json!({ "feature": "mini_studio" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post("/api/credits/spend", &user.token, json!({ "feature": "relationship_profiles" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cost"], 15);
    assert_eq!(body["spent"]["monthly"], 15);
    assert_eq!(body["wallet"]["total"], 185);

    let (_, body) = app.get("/api/credits", &user.token).await;
    assert_eq!(ledger_reasons(&body), vec!["spend", "plan_change"]);
    assert_eq!(body["ledger"][0]["delta"], -15);
    assert_eq!(body["ledger"][0]["feature"], "relationship_profiles");
    assert_eq!(body["ledger"][0]["balance_after"], 185);
    assert!(body["next_reset_at"].is_string());
}

#[tokio::test]
async fn test_insufficient_credits_is_402_and_changes_nothing() {
    let app = TestApp::new();
    let user = app.register("gold@example.com").await;
    app.set_plan(&user, "gold").await;

    // 500 credits: 25 mini studio sessions, then nothing.
    for _ in 0..25 {
        let (status, _) = app
            .post("/api/credits/spend", &user.token, json!({ "feature": "mini_studio" }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = app
        .post("/api/credits/spend", &user.token, json!({ "feature": "ai_images" }))
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("insufficient credits"));

    let (_, body) = app.get("/api/credits", &user.token).await;
    assert_eq!(body["wallet"]["total"], 0);
    assert_eq!(body["ledger"].as_array().unwrap().len(), 26);
}

#[tokio::test]
async fn test_trial_elevates_access_not_quotas() {
    let app = TestApp::new();
    let user = app.register("trial@example.com").await;

    let (status, body) = app.post("/api/trial/start", &user.token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["active"], true);
    assert_eq!(body["trial_credits"], 60);
    assert!(body["remaining_secs"].as_i64().unwrap() > 4 * 3600);

    let (status, body) = app.post("/api/trial/start", &user.token, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "trial already used");

    let (status, ent) = app.get("/api/entitlements", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ent["plan"], "bronze");
    assert_eq!(ent["access_tier"], "gold");
    assert_eq!(ent["wallet"]["trial"], 60);
    let fortune = ent["usage"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["feature"] == "fortune")
        .unwrap();
    assert_eq!(fortune["limit"], 2);
    assert!(
        ent["companions"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c == "galaxy")
    );

    // Gold-only credit feature is open during the trial, paid from trial credits.
    let (status, body) = app
        .post("/api/credits/spend", &user.token, json!({ "feature": "mini_studio" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spent"]["trial"], 20);

    let (status, _) = app
        .post("/api/companions/select", &user.token, json!({ "companion": "galaxy" }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_trial_forfeits_credits() {
    let app = TestApp::new();
    let user = app.register("late-trial@example.com").await;
    let (status, _) = app.post("/api/trial/start", &user.token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);

    app.sql(
        "UPDATE users SET trial_started_at = datetime('now', '-6 hours') WHERE id = ?1",
        &user.id,
    );

    let (status, body) = app.get("/api/trial", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);
    assert_eq!(body["used"], true);
    assert_eq!(body["trial_credits"], 0);

    let (_, body) = app.get("/api/credits", &user.token).await;
    assert_eq!(ledger_reasons(&body), vec!["trial_expired", "trial_grant"]);
    assert_eq!(body["ledger"][0]["delta"], -60);

    let (status, _) = app
        .post("/api/credits/spend", &user.token, json!({ "feature": "ai_images" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_trial_is_bronze_only() {
    let app = TestApp::new();
    let user = app.register("paid@example.com").await;
    app.set_plan(&user, "silver").await;

    let (status, _) = app.post("/api/trial/start", &user.token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_usage_limits() {
    let app = TestApp::new();
    let user = app.register("quota@example.com").await;

    for expected_remaining in [1, 0] {
        let (status, body) = app.post("/api/usage/fortune", &user.token, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["remaining"], expected_remaining);
    }
    let (status, body) = app.post("/api/usage/fortune", &user.token, json!({})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("fortune"));

    let (status, _) = app.post("/api/usage/astral_projection", &user.token, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/usage", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    let fortune = body["usage"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["feature"] == "fortune")
        .unwrap()
        .clone();
    assert_eq!(fortune["used"], 2);
    assert_eq!(fortune["remaining"], 0);

    // Gold has no daily limits.
    app.set_plan(&user, "gold").await;
    let (status, body) = app.post("/api/usage/fortune", &user.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["limit"].is_null());
}

#[tokio::test]
async fn test_entitlements_snapshot_tracks_writes() {
    let app = TestApp::new();
    let user = app.register("snap@example.com").await;

    let (_, before) = app.get("/v1/entitlements", &user.token).await;
    assert_eq!(before["wallet"]["total"], 0);

    app.admin(
        "POST",
        &format!("/api/admin/users/{}/credits", user.id),
        json!({ "amount": 40 }),
    )
    .await;

    let (_, after) = app.get("/api/entitlements", &user.token).await;
    assert_eq!(after["wallet"]["purchased"], 40);
    assert_eq!(after["wallet"]["total"], 40);
}

#[tokio::test]
async fn test_tiers_table_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/tiers", None, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tiers"].as_array().unwrap().len(), 3);
    assert_eq!(body["tiers"][1]["tier"], "silver");
    assert_eq!(body["tiers"][1]["monthly_credits"], 200);
    assert_eq!(body["credit_costs"].as_array().unwrap().len(), 5);
}
