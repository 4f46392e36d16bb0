use axum::{Json, extract::State};

use soulbridge_api::{
    CreditsResponse, LedgerEntry, LedgerReason, SpendCreditsRequest, SpendCreditsResponse, db,
    service::format_sqlite,
};

use crate::Caches;
use crate::account;
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::routes::now;
use crate::storage::{Db, sq_query_map};

const LEDGER_PAGE: u64 = 50;

/// GET /api/credits — wallet breakdown and recent ledger.
pub async fn summary(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<CreditsResponse>, ApiErr> {
    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now())?;
    let ledger = sq_query_map(
        &conn,
        db::credits::list_recent(&user.user_id, LEDGER_PAGE),
        |row| {
            Ok(LedgerEntry {
                id: row.get(0)?,
                delta: row.get(1)?,
                reason: row.get(2)?,
                feature: row.get(3)?,
                balance_after: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    )
    .map_err(ApiErr::from_db("list ledger"))?;

    Ok(Json(CreditsResponse {
        wallet: account.wallet.into(),
        next_reset_at: account.credits_reset_at.map(format_sqlite),
        ledger,
    }))
}

/// POST /api/credits/spend — pay for one use of a premium feature.
pub async fn spend(
    State(db): State<Db>,
    State(caches): State<Caches>,
    user: AuthUser,
    Json(req): Json<SpendCreditsRequest>,
) -> Result<Json<SpendCreditsResponse>, ApiErr> {
    let now = now();
    let feature = req.feature;
    let conn = db.conn();
    let mut account = account::load(&conn, &user.user_id, now)?;

    if !feature.allowed_for(account.access_tier(now)) {
        return Err(ApiErr::forbidden(format!(
            "{} requires the {} plan",
            feature.as_str(),
            feature.min_tier()
        )));
    }

    let cost = feature.cost();
    let spent = account.wallet.spend(cost)?;
    account::apply_change(
        &conn,
        &user.user_id,
        &account.wallet,
        -cost,
        LedgerReason::Spend,
        Some(feature.as_str()),
    )?;
    caches.forget_user(&user.user_id);

    tracing::debug!(user_id = %user.user_id, feature = feature.as_str(), cost, "credits spent");
    Ok(Json(SpendCreditsResponse {
        feature,
        cost,
        spent,
        wallet: account.wallet.into(),
    }))
}
