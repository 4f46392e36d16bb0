use axum::{Json, extract::State};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use soulbridge_api::{
    LedgerReason, Milestone, OkResponse, ReferralClaimRequest, ReferralStatsResponse, db,
    referral::{self, Party},
};

use crate::account;
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::routes::{is_unique_violation, now};
use crate::storage::{Db, in_transaction, sq_execute, sq_query_row};
use crate::{AppConfig, Caches};

/// Owner of a referral code.
pub struct CodeOwner {
    pub user_id: String,
    pub email: String,
    pub code: String,
}

/// Resolve a normalized code, 404 when nobody owns it.
pub fn find_code_owner(conn: &Connection, code: &str) -> Result<CodeOwner, ApiErr> {
    let found = sq_query_row(conn, db::users::get_by_referral_code(code), |row| {
        Ok(CodeOwner {
            user_id: row.get(0)?,
            email: row.get(1)?,
            code: row.get(2)?,
        })
    });
    match found {
        Ok(owner) => Ok(owner),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            Err(ApiErr::not_found("referral code not found"))
        }
        Err(e) => Err(ApiErr::from_db("referral code lookup")(e)),
    }
}

/// Successful referrals credited to `user_id`.
pub fn count(conn: &Connection, user_id: &str) -> Result<u32, ApiErr> {
    let n: i64 = sq_query_row(conn, db::referrals::count_for_referrer(user_id), |row| {
        row.get(0)
    })
    .map_err(ApiErr::from_db("count referrals"))?;
    Ok(u32::try_from(n).unwrap_or(u32::MAX))
}

/// Record `referee_id` under `owner` and pay the referrer's bonus.
/// A referee can only ever be referred once. Joins the caller's transaction
/// if one is open.
pub fn record(
    conn: &Connection,
    owner: &CodeOwner,
    referee_id: &str,
    now: NaiveDateTime,
) -> Result<(), ApiErr> {
    in_transaction(conn, |tx| {
        let id = Uuid::new_v4().to_string();
        sq_execute(
            tx,
            db::referrals::insert(&id, &owner.user_id, referee_id, &owner.code),
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiErr::conflict("this account has already been referred")
            } else {
                ApiErr::from_db("insert referral")(e)
            }
        })?;

        let mut referrer = account::load(tx, &owner.user_id, now)?;
        referrer
            .wallet
            .add_purchased(referral::REFERRAL_BONUS_CREDITS)?;
        account::apply_change(
            tx,
            &owner.user_id,
            &referrer.wallet,
            referral::REFERRAL_BONUS_CREDITS,
            LedgerReason::ReferralBonus,
            None,
        )?;
        Ok(())
    })?;

    tracing::info!(
        referrer = %owner.user_id,
        referee = %referee_id,
        "referral recorded"
    );
    Ok(())
}

/// GET /api/referrals — own code, share link, and milestone progress.
pub async fn stats(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    user: AuthUser,
) -> Result<Json<ReferralStatsResponse>, ApiErr> {
    let conn = db.conn();
    let code: String = sq_query_row(&conn, db::users::get_profile(&user.user_id), |row| {
        row.get(5)
    })
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => ApiErr::not_found("user not found"),
        e => ApiErr::from_db("load referral code")(e),
    })?;

    let referral_count = count(&conn, &user.user_id)?;
    let referred_by = match sq_query_row(
        &conn,
        db::referrals::referrer_nickname(&user.user_id),
        |row| row.get::<_, String>(0),
    ) {
        Ok(nickname) => Some(nickname),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(ApiErr::from_db("load referrer")(e)),
    };

    Ok(Json(ReferralStatsResponse {
        share_url: referral::share_url(&config.base_url, &code),
        code,
        referral_count,
        referred_by,
        unlocked: referral::unlocked_rewards(referral_count),
        next_milestone: referral::next_milestone(referral_count).map(|(referrals, companion)| {
            Milestone {
                referrals,
                companion: companion.to_string(),
            }
        }),
    }))
}

/// POST /api/referrals/claim — attach a referral code after sign-up.
pub async fn claim(
    State(db): State<Db>,
    State(caches): State<Caches>,
    user: AuthUser,
    Json(req): Json<ReferralClaimRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    let now = now();
    let code = referral::normalize_code(&req.code)?;

    let conn = db.conn();
    let me = account::load(&conn, &user.user_id, now)?;
    referral::check_claim_window(me.created_at, now)?;

    let owner = find_code_owner(&conn, &code)?;
    referral::check_referral(
        &Party {
            user_id: &owner.user_id,
            email: &owner.email,
        },
        &Party {
            user_id: &me.user_id,
            email: &me.email,
        },
    )?;

    record(&conn, &owner, &me.user_id, now)?;
    caches.forget_user(&owner.user_id);
    caches.forget_user(&me.user_id);
    Ok(Json(OkResponse { ok: true }))
}
