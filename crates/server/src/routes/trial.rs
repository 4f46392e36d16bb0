use axum::{Json, extract::State, http::StatusCode};
use chrono::NaiveDateTime;

use soulbridge_api::{
    LedgerReason, TrialStatusResponse, db,
    service::format_sqlite,
    trial::{self, TrialState},
};

use crate::Caches;
use crate::account::{self, Account};
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::routes::now;
use crate::storage::{Db, in_transaction, sq_execute};

pub fn status_of(account: &Account, now: NaiveDateTime) -> TrialStatusResponse {
    let state = account.trial(now);
    let remaining_secs = match state {
        TrialState::Active { remaining_secs, .. } => remaining_secs,
        _ => 0,
    };
    TrialStatusResponse {
        active: state.is_active(),
        used: account.trial_used,
        started_at: account.trial_started_at.map(format_sqlite),
        ends_at: state.ends_at().map(format_sqlite),
        remaining_secs,
        trial_credits: account.wallet.trial,
    }
}

/// GET /api/trial
pub async fn status(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<TrialStatusResponse>, ApiErr> {
    let now = now();
    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now)?;
    Ok(Json(status_of(&account, now)))
}

/// POST /api/trial/start — one five-hour trial per Bronze account.
pub async fn start(
    State(db): State<Db>,
    State(caches): State<Caches>,
    user: AuthUser,
) -> Result<(StatusCode, Json<TrialStatusResponse>), ApiErr> {
    let now = now();
    let conn = db.conn();
    let mut account = account::load(&conn, &user.user_id, now)?;
    trial::check_can_start(account.plan, account.trial_used)?;

    let delta = trial::TRIAL_CREDITS - account.wallet.trial;
    account.wallet.trial = trial::TRIAL_CREDITS;
    in_transaction(&conn, |tx| {
        let changed = sq_execute(
            tx,
            db::users::start_trial(&user.user_id, &format_sqlite(now), trial::TRIAL_CREDITS),
        )
        .map_err(ApiErr::from_db("start trial"))?;
        if changed == 0 {
            return Err(ApiErr::conflict("trial already used"));
        }
        account::apply_change(
            tx,
            &user.user_id,
            &account.wallet,
            delta,
            LedgerReason::TrialGrant,
            None,
        )
    })?;
    account.trial_started_at = Some(now);
    account.trial_used = true;
    caches.forget_user(&user.user_id);

    tracing::info!(user_id = %user.user_id, "trial started");
    Ok((StatusCode::CREATED, Json(status_of(&account, now))))
}
