mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn test_horoscope_is_stable_and_metered() {
    let app = TestApp::new();
    let user = app.register("stars@example.com").await;

    let (status, first) = app.get("/api/horoscope/leo", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["reading"]["sign"], "leo");
    assert_eq!(first["reading"]["element"], "fire");
    assert_eq!(first["usage"]["used"], 1);

    // Same day, same sign: same reading, but it still counts.
    let (status, second) = app.get("/api/horoscope/Leo", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["reading"], first["reading"]);
    assert_eq!(second["usage"]["used"], 2);

    let (status, dated) = app
        .get("/api/horoscope/leo?date=2026-01-01", &user.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dated["reading"]["date"], "2026-01-01");
    assert_eq!(dated["usage"]["remaining"], 0);

    let (status, _) = app.get("/api/horoscope/leo", &user.token).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_horoscope_rejects_bad_input() {
    let app = TestApp::new();
    let user = app.register("badsign@example.com").await;

    let (status, _) = app.get("/api/horoscope/ophiuchus", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .get("/api/horoscope/leo?date=tomorrow", &user.token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Rejected requests do not use the quota.
    let (_, usage) = app.get("/api/usage", &user.token).await;
    assert!(
        usage["usage"]
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u["used"] == 0)
    );
}

#[tokio::test]
async fn test_readings_differ_between_users() {
    let app = TestApp::new();
    let a = app.register("reader-a@example.com").await;
    let b = app.register("reader-b@example.com").await;

    let (_, ra) = app
        .post("/api/tarot", &a.token, json!({ "spread": "three_card" }))
        .await;
    let (_, rb) = app
        .post("/api/tarot", &b.token, json!({ "spread": "three_card" }))
        .await;
    assert_eq!(ra["reading"]["cards"].as_array().unwrap().len(), 3);
    assert_ne!(ra["reading"]["cards"], rb["reading"]["cards"]);
}

#[tokio::test]
async fn test_tarot_spreads_and_gate() {
    let app = TestApp::new();
    let user = app.register("tarot@example.com").await;

    let (status, body) = app
        .post("/api/tarot", &user.token, json!({ "spread": "celtic_cross" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "the celtic_cross spread requires the silver plan");

    let (status, body) = app
        .post("/api/tarot", &user.token, json!({ "question": "  what next?  " }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reading"]["spread"], "single");
    assert_eq!(body["reading"]["question"], "what next?");
    assert_eq!(body["reading"]["cards"].as_array().unwrap().len(), 1);
    assert_eq!(body["reading"]["cards"][0]["position"], "guidance");
    // The gated request above did not consume the fortune quota.
    assert_eq!(body["usage"]["used"], 1);

    let (status, again) = app
        .post("/api/tarot", &user.token, json!({ "question": "what next?" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["reading"], body["reading"]);

    let (status, _) = app.post("/api/tarot", &user.token, json!({})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    app.set_plan(&user, "silver").await;
    let (status, body) = app
        .post("/api/tarot", &user.token, json!({ "spread": "celtic_cross" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reading"]["cards"].as_array().unwrap().len(), 10);
}
