use axum::{Json, extract::State};
use chrono::{NaiveDateTime, NaiveTime};
use std::time::Duration;

use soulbridge_api::{
    CreditAccess, CreditCost, CreditFeature, EntitlementsResponse, FeatureLimit, LimitedFeature,
    MeResponse, Tier, TierInfo, TiersResponse, companions, db,
    service::usage_date,
    tier,
    trial::TrialState,
};

use crate::Caches;
use crate::account::{self, Account};
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::routes::{now, referrals, trial, usage};
use crate::storage::{Db, sq_query_row};

/// GET /api/me, /v1/me
pub async fn me(State(db): State<Db>, user: AuthUser) -> Result<Json<MeResponse>, ApiErr> {
    let conn = db.conn();
    sq_query_row(&conn, db::users::get_profile(&user.user_id), |row| {
        let plan: String = row.get(3)?;
        Ok(MeResponse {
            user_id: row.get(0)?,
            email: row.get(1)?,
            nickname: row.get(2)?,
            plan: Tier::from_plan(&plan),
            selected_companion: row.get(4)?,
            referral_code: row.get(5)?,
            created_at: row.get(6)?,
        })
    })
    .map(Json)
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => ApiErr::not_found("user not found"),
        e => ApiErr::from_db("load profile")(e),
    })
}

/// GET /api/entitlements, /v1/entitlements — everything the client needs to
/// gate its UI, served from a short-lived per-user snapshot.
pub async fn entitlements(
    State(db): State<Db>,
    State(caches): State<Caches>,
    user: AuthUser,
) -> Result<Json<EntitlementsResponse>, ApiErr> {
    let key = format!("{}:entitlements", user.user_id);
    if let Some(snapshot) = caches.entitlements.get(&key) {
        return Ok(Json(snapshot));
    }

    let now = now();
    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now)?;
    let access_tier = account.access_tier(now);
    let referral_count = referrals::count(&conn, &user.user_id)?;
    let usage = usage::entries_for_day(&conn, &user.user_id, account.plan, &usage_date(now))?;

    let snapshot = EntitlementsResponse {
        plan: account.plan,
        access_tier,
        trial: trial::status_of(&account, now),
        usage,
        wallet: account.wallet.into(),
        credit_features: CreditFeature::ALL
            .into_iter()
            .map(|feature| CreditAccess {
                feature,
                cost: feature.cost(),
                min_tier: feature.min_tier(),
                allowed: feature.allowed_for(access_tier),
            })
            .collect(),
        companions: companions::unlocked_ids(access_tier, referral_count),
        library_capacity: tier::library_capacity(account.plan),
        max_message_chars: tier::max_message_chars(account.plan),
    };

    caches
        .entitlements
        .insert_for(key, snapshot.clone(), snapshot_lifetime(&account, now));
    Ok(Json(snapshot))
}

/// A snapshot must not outlive the next point where it changes on its own:
/// the UTC day rollover, the trial end, or the monthly reset.
fn snapshot_lifetime(account: &Account, now: NaiveDateTime) -> Duration {
    let mut deadlines = Vec::with_capacity(3);
    if let Some(tomorrow) = now.date().succ_opt() {
        deadlines.push(tomorrow.and_time(NaiveTime::MIN));
    }
    if let TrialState::Active { ends_at, .. } = account.trial(now) {
        deadlines.push(ends_at);
    }
    if let Some(reset_at) = account.credits_reset_at {
        deadlines.push(reset_at);
    }
    deadlines
        .into_iter()
        .filter(|d| *d > now)
        .min()
        .and_then(|d| (d - now).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

/// GET /api/tiers — the static plan table.
pub async fn tiers() -> Json<TiersResponse> {
    let tiers = Tier::ALL
        .into_iter()
        .map(|t| TierInfo {
            tier: t,
            monthly_credits: tier::monthly_credits(t),
            daily_limits: LimitedFeature::ALL
                .into_iter()
                .map(|feature| FeatureLimit {
                    feature,
                    limit: tier::daily_limit(t, feature),
                })
                .collect(),
            library_capacity: tier::library_capacity(t),
            max_message_chars: tier::max_message_chars(t),
        })
        .collect();
    let credit_costs = CreditFeature::ALL
        .into_iter()
        .map(|feature| CreditCost {
            feature,
            cost: feature.cost(),
            min_tier: feature.min_tier(),
        })
        .collect();
    Json(TiersResponse {
        tiers,
        credit_costs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use soulbridge_api::Wallet;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn account(trial_started_at: Option<NaiveDateTime>) -> Account {
        Account {
            user_id: "u1".into(),
            email: "a@example.com".into(),
            plan: Tier::Bronze,
            wallet: Wallet::default(),
            credits_reset_at: None,
            trial_started_at,
            trial_used: trial_started_at.is_some(),
            created_at: at(0),
        }
    }

    #[test]
    fn test_snapshot_expires_at_midnight() {
        assert_eq!(
            snapshot_lifetime(&account(None), at(22)),
            Duration::from_secs(2 * 3600)
        );
    }

    #[test]
    fn test_snapshot_expires_with_trial() {
        // Trial started at 10:00 ends at 15:00.
        assert_eq!(
            snapshot_lifetime(&account(Some(at(10))), at(12)),
            Duration::from_secs(3 * 3600)
        );
    }
}
