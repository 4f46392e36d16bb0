use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use std::collections::HashMap;

use soulbridge_api::{
    LimitedFeature, Tier, UsageEntry, UsageResponse, db,
    service::usage_date,
    tier::{daily_limit, remaining},
};

use crate::Caches;
use crate::account;
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::routes::now;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_row};

fn entry(feature: LimitedFeature, plan: Tier, used: u32) -> UsageEntry {
    let limit = daily_limit(plan, feature);
    UsageEntry {
        feature,
        used,
        limit,
        remaining: remaining(limit, used),
    }
}

/// Every limited feature's counter for `date`, limits taken from `plan`.
pub fn entries_for_day(
    conn: &Connection,
    user_id: &str,
    plan: Tier,
    date: &str,
) -> Result<Vec<UsageEntry>, ApiErr> {
    let counts: HashMap<String, i64> = sq_query_map(
        conn,
        db::usage::list_for_day(user_id, date),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(ApiErr::from_db("list usage"))?
    .into_iter()
    .collect();

    Ok(LimitedFeature::ALL
        .into_iter()
        .map(|f| {
            let used = counts.get(f.as_str()).copied().unwrap_or(0);
            entry(f, plan, u32::try_from(used).unwrap_or(u32::MAX))
        })
        .collect())
}

/// Take one use of `feature` for `date`. At the plan's limit this fails with
/// 429 and leaves the counter untouched.
pub fn consume_one(
    conn: &Connection,
    user_id: &str,
    plan: Tier,
    feature: LimitedFeature,
    date: &str,
) -> Result<UsageEntry, ApiErr> {
    let used = match sq_query_row(
        conn,
        db::usage::get_count(user_id, feature.as_str(), date),
        |row| row.get::<_, i64>(0),
    ) {
        Ok(n) => u32::try_from(n).unwrap_or(u32::MAX),
        Err(rusqlite::Error::QueryReturnedNoRows) => 0,
        Err(e) => return Err(ApiErr::from_db("read usage")(e)),
    };

    if let Some(limit) = daily_limit(plan, feature) {
        if used >= limit {
            return Err(ApiErr::too_many_requests(format!(
                "daily limit of {limit} reached for {feature}"
            )));
        }
    }

    sq_execute(conn, db::usage::increment(user_id, feature.as_str(), date))
        .map_err(ApiErr::from_db("increment usage"))?;
    Ok(entry(feature, plan, used.saturating_add(1)))
}

/// GET /api/usage — today's counters.
pub async fn today(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<UsageResponse>, ApiErr> {
    let now = now();
    let date = usage_date(now);
    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now)?;
    let usage = entries_for_day(&conn, &user.user_id, account.plan, &date)?;
    Ok(Json(UsageResponse { date, usage }))
}

/// POST /api/usage/{feature} — consume one use of a limited feature.
pub async fn consume(
    State(db): State<Db>,
    State(caches): State<Caches>,
    user: AuthUser,
    Path(feature): Path<String>,
) -> Result<Json<UsageEntry>, ApiErr> {
    let feature: LimitedFeature = feature.parse()?;
    let now = now();
    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now)?;
    let entry = consume_one(&conn, &user.user_id, account.plan, feature, &usage_date(now))?;
    caches.forget_user(&user.user_id);
    Ok(Json(entry))
}
