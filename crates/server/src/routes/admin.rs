//! Operator endpoints guarded by `X-SoulBridge-Admin-Key`. Plan changes made
//! here are what a billing integration would call.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use chrono::Months;

use soulbridge_api::{
    AdminGrantCreditsRequest, AdminSetPlanRequest, AdminUserResponse, LedgerReason, Tier, db,
    tier,
};

use crate::account;
use crate::error::ApiErr;
use crate::routes::now;
use crate::storage::{Db, in_transaction, sq_execute};
use crate::{AppConfig, Caches};

const ADMIN_KEY_HEADER: &str = "X-SoulBridge-Admin-Key";

fn require_admin(headers: &HeaderMap, config: &AppConfig) -> Result<(), ApiErr> {
    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or("");

    let expected = config.admin_key.trim();
    if expected.is_empty() || provided != expected {
        return Err(ApiErr::unauthorized("invalid admin key"));
    }
    Ok(())
}

/// PUT /api/admin/users/{id}/plan
pub async fn set_plan(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    State(caches): State<Caches>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AdminSetPlanRequest>,
) -> Result<Json<AdminUserResponse>, ApiErr> {
    require_admin(&headers, &config)?;
    let plan: Tier = req.plan.parse()?;
    let now = now();

    let conn = db.conn();
    let mut account = account::load(&conn, &id, now)?;
    if account.plan != plan {
        // The new allowance replaces whatever was left of the old one.
        let allowance = tier::monthly_credits(plan);
        let delta = allowance - account.wallet.monthly;
        account.wallet.monthly = allowance;
        let next_reset = if allowance > 0 {
            now.checked_add_months(Months::new(1))
        } else {
            None
        };

        in_transaction(&conn, |tx| {
            sq_execute(tx, db::users::update_plan(&id, plan.as_str()))
                .map_err(ApiErr::from_db("update plan"))?;
            if delta != 0 {
                account::apply_change(
                    tx,
                    &id,
                    &account.wallet,
                    delta,
                    LedgerReason::PlanChange,
                    None,
                )?;
            }
            account::set_reset_at(tx, &id, next_reset)
        })?;

        tracing::info!(user_id = %id, from = %account.plan, to = %plan, "plan changed");
        account.plan = plan;
        caches.forget_user(&id);
    }

    Ok(Json(AdminUserResponse {
        user_id: id,
        plan: account.plan,
        wallet: account.wallet.into(),
    }))
}

/// POST /api/admin/users/{id}/credits — add purchased credits.
pub async fn grant_credits(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    State(caches): State<Caches>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<AdminGrantCreditsRequest>,
) -> Result<Json<AdminUserResponse>, ApiErr> {
    require_admin(&headers, &config)?;
    if req.amount <= 0 {
        return Err(ApiErr::bad_request("amount must be positive"));
    }

    let conn = db.conn();
    let mut account = account::load(&conn, &id, now())?;
    account.wallet.add_purchased(req.amount)?;
    account::apply_change(
        &conn,
        &id,
        &account.wallet,
        req.amount,
        LedgerReason::AdminGrant,
        None,
    )?;
    caches.forget_user(&id);

    tracing::info!(
        user_id = %id,
        amount = req.amount,
        reason = req.reason.as_deref().unwrap_or(""),
        "credits granted"
    );
    Ok(Json(AdminUserResponse {
        user_id: id,
        plan: account.plan,
        wallet: account.wallet.into(),
    }))
}
