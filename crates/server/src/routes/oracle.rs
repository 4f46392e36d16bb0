//! Daily readings. Each request takes one use of the matching daily quota,
//! even when the reading itself is served from cache.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use soulbridge_api::{
    LimitedFeature, ReadingResponse,
    oracle::{self, TarotRequest, ZodiacSign},
    service::usage_date,
};

use crate::Caches;
use crate::account;
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::routes::{now, usage};
use crate::storage::Db;

#[derive(Debug, Default, Deserialize)]
pub struct HoroscopeQuery {
    /// `YYYY-MM-DD`; defaults to today (UTC).
    pub date: Option<String>,
}

fn cached_or_generate<T, F>(
    caches: &Caches,
    key: String,
    generate: F,
) -> Result<serde_json::Value, ApiErr>
where
    T: Serialize,
    F: FnOnce() -> T,
{
    if let Some(hit) = caches.readings.get(&key) {
        return Ok(hit);
    }
    let value = serde_json::to_value(generate()).map_err(ApiErr::from_db("serialize reading"))?;
    caches.readings.insert(key, value.clone());
    Ok(value)
}

/// GET /api/horoscope/{sign}?date=
pub async fn horoscope(
    State(db): State<Db>,
    State(caches): State<Caches>,
    user: AuthUser,
    Path(sign): Path<String>,
    Query(q): Query<HoroscopeQuery>,
) -> Result<Json<ReadingResponse<serde_json::Value>>, ApiErr> {
    let sign: ZodiacSign = sign.parse()?;
    let now = now();
    let today = usage_date(now);
    let date = match q.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| ApiErr::bad_request("date must be YYYY-MM-DD"))?
            .format("%Y-%m-%d")
            .to_string(),
        None => today.clone(),
    };

    let usage = {
        let conn = db.conn();
        let account = account::load(&conn, &user.user_id, now)?;
        usage::consume_one(
            &conn,
            &user.user_id,
            account.plan,
            LimitedFeature::Horoscope,
            &today,
        )?
    };
    caches.forget_user(&user.user_id);

    let key = format!("{}:horoscope:{}:{date}", user.user_id, sign.as_str());
    let reading = cached_or_generate(&caches, key, || {
        oracle::daily_horoscope(&user.user_id, sign, &date)
    })?;
    Ok(Json(ReadingResponse { reading, usage }))
}

/// POST /api/tarot — draw today's spread.
pub async fn tarot(
    State(db): State<Db>,
    State(caches): State<Caches>,
    user: AuthUser,
    Json(req): Json<TarotRequest>,
) -> Result<Json<ReadingResponse<serde_json::Value>>, ApiErr> {
    let now = now();
    let today = usage_date(now);

    let usage = {
        let conn = db.conn();
        let account = account::load(&conn, &user.user_id, now)?;
        let min_tier = req.spread.min_tier();
        if account.access_tier(now) < min_tier {
            return Err(ApiErr::forbidden(format!(
                "the {} spread requires the {min_tier} plan",
                req.spread.as_str()
            )));
        }
        usage::consume_one(
            &conn,
            &user.user_id,
            account.plan,
            LimitedFeature::Fortune,
            &today,
        )?
    };
    caches.forget_user(&user.user_id);

    let question = req
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());
    let key = format!(
        "{}:tarot:{}:{today}:{}",
        user.user_id,
        req.spread.as_str(),
        question.unwrap_or("")
    );
    let reading = cached_or_generate(&caches, key, || {
        oracle::draw(&user.user_id, &today, req.spread, question)
    })?;
    Ok(Json(ReadingResponse { reading, usage }))
}
