use axum::{Json, extract::State};
use rusqlite::Connection;

use soulbridge_api::{
    CompanionResponse, ListCompanionsResponse, SelectCompanionRequest,
    companions::{self, Companion},
    db,
};

use crate::account;
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::routes::{now, referrals};
use crate::storage::{Db, sq_execute, sq_query_row};

fn to_response(c: &Companion, unlocked: bool, selected: &str) -> CompanionResponse {
    CompanionResponse {
        id: c.id.to_string(),
        name: c.name.to_string(),
        min_tier: c.min_tier,
        referrals_required: c.referrals_required,
        unlocked,
        selected: c.id == selected,
    }
}

pub(crate) fn selected_companion(conn: &Connection, user_id: &str) -> Result<String, ApiErr> {
    sq_query_row(conn, db::users::get_profile(user_id), |row| row.get(4)).map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => ApiErr::not_found("user not found"),
        e => ApiErr::from_db("load selected companion")(e),
    })
}

/// Look up a companion and make sure this user may talk to it.
pub(crate) fn unlocked_companion(
    conn: &Connection,
    user_id: &str,
    id: &str,
) -> Result<&'static Companion, ApiErr> {
    let companion =
        companions::find(id).ok_or_else(|| ApiErr::not_found(format!("unknown companion: {id}")))?;
    let now = now();
    let account = account::load(conn, user_id, now)?;
    let referral_count = referrals::count(conn, user_id)?;
    if !companion.is_unlocked(account.access_tier(now), referral_count) {
        let how = match companion.referrals_required {
            Some(n) => format!("{n} referrals"),
            None => format!("the {} plan", companion.min_tier),
        };
        return Err(ApiErr::forbidden(format!(
            "{} is locked (requires {how})",
            companion.name
        )));
    }
    Ok(companion)
}

/// GET /api/companions — full catalog with lock state.
pub async fn list(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListCompanionsResponse>, ApiErr> {
    let now = now();
    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now)?;
    let access_tier = account.access_tier(now);
    let referral_count = referrals::count(&conn, &user.user_id)?;
    let selected = selected_companion(&conn, &user.user_id)?;

    let companions = companions::CATALOG
        .iter()
        .map(|c| to_response(c, c.is_unlocked(access_tier, referral_count), &selected))
        .collect();
    Ok(Json(ListCompanionsResponse { companions }))
}

/// POST /api/companions/select
pub async fn select(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<SelectCompanionRequest>,
) -> Result<Json<CompanionResponse>, ApiErr> {
    let id = req.companion.trim().to_ascii_lowercase();
    let conn = db.conn();
    let companion = unlocked_companion(&conn, &user.user_id, &id)?;
    sq_execute(
        &conn,
        db::users::update_selected_companion(&user.user_id, companion.id),
    )
    .map_err(ApiErr::from_db("select companion"))?;
    Ok(Json(to_response(companion, true, companion.id)))
}
