//! Plan, wallet, and trial state of one user.
//!
//! Loading an account applies the lazy transitions first: trial credits are
//! forfeited once the trial window has closed, and the monthly allowance is
//! replaced when its reset date has passed. Each balance change writes the
//! wallet and a ledger row in one transaction.

use chrono::NaiveDateTime;
use rusqlite::{Connection, Row};

use soulbridge_api::credits::{self, LedgerReason, Wallet};
use soulbridge_api::db;
use soulbridge_api::service::{format_sqlite, parse_sqlite};
use soulbridge_api::tier::{self, Tier};
use soulbridge_api::trial::TrialState;

use crate::error::ApiErr;
use crate::storage::{in_transaction, sq_execute, sq_query_row};

#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: String,
    pub email: String,
    pub plan: Tier,
    pub wallet: Wallet,
    pub credits_reset_at: Option<NaiveDateTime>,
    pub trial_started_at: Option<NaiveDateTime>,
    pub trial_used: bool,
    pub created_at: NaiveDateTime,
}

impl Account {
    pub fn trial(&self, now: NaiveDateTime) -> TrialState {
        TrialState::at(self.trial_started_at, now)
    }

    /// Tier used for access checks (trial counts as Gold).
    pub fn access_tier(&self, now: NaiveDateTime) -> Tier {
        tier::effective_access_tier(self.plan, self.trial(now).is_active())
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let plan: String = row.get(2)?;
    let reset_at: Option<String> = row.get(6)?;
    let trial_started_at: Option<String> = row.get(7)?;
    let trial_used: i64 = row.get(8)?;
    let created_at: String = row.get(9)?;
    Ok(Account {
        user_id: row.get(0)?,
        email: row.get(1)?,
        plan: Tier::from_plan(&plan),
        wallet: Wallet {
            monthly: row.get(3)?,
            purchased: row.get(4)?,
            trial: row.get(5)?,
        },
        credits_reset_at: reset_at.as_deref().and_then(parse_sqlite),
        trial_started_at: trial_started_at.as_deref().and_then(parse_sqlite),
        trial_used: trial_used != 0,
        created_at: parse_sqlite(&created_at).unwrap_or_default(),
    })
}

/// Load an account and bring its wallet up to date as of `now`.
pub fn load(conn: &Connection, user_id: &str, now: NaiveDateTime) -> Result<Account, ApiErr> {
    let mut account = match sq_query_row(conn, db::users::get_account(user_id), account_from_row) {
        Ok(account) => account,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(ApiErr::not_found("user not found"));
        }
        Err(e) => return Err(ApiErr::from_db("load account")(e)),
    };

    if matches!(account.trial(now), TrialState::Expired { .. }) && account.wallet.trial > 0 {
        let forfeited = account.wallet.trial;
        account.wallet.trial = 0;
        apply_change(
            conn,
            &account.user_id,
            &account.wallet,
            -forfeited,
            LedgerReason::TrialExpired,
            None,
        )?;
        tracing::info!(user_id, forfeited, "trial ended, trial credits forfeited");
    }

    let refresh = credits::monthly_refresh_due(account.plan, account.credits_reset_at, now);
    if let Some(next_reset) = refresh {
        let allowance = tier::monthly_credits(account.plan);
        let delta = allowance - account.wallet.monthly;
        account.wallet.monthly = allowance;
        in_transaction(conn, |tx| {
            apply_change(
                tx,
                &account.user_id,
                &account.wallet,
                delta,
                LedgerReason::MonthlyRefresh,
                None,
            )?;
            set_reset_at(tx, &account.user_id, Some(next_reset))
        })?;
        account.credits_reset_at = Some(next_reset);
        tracing::info!(user_id, allowance, "monthly allowance refreshed");
    }

    Ok(account)
}

/// Persist `wallet` and append a ledger row for the change that produced it.
/// Joins the caller's transaction if one is open.
pub fn apply_change(
    conn: &Connection,
    user_id: &str,
    wallet: &Wallet,
    delta: i64,
    reason: LedgerReason,
    feature: Option<&str>,
) -> Result<(), ApiErr> {
    in_transaction(conn, |tx| {
        sq_execute(tx, db::users::update_wallet(user_id, wallet))
            .map_err(ApiErr::from_db("update wallet"))?;
        sq_execute(
            tx,
            db::credits::insert_entry(user_id, delta, reason.as_str(), feature, wallet.total()),
        )
        .map_err(ApiErr::from_db("insert ledger entry"))?;
        Ok(())
    })
}

pub fn set_reset_at(
    conn: &Connection,
    user_id: &str,
    at: Option<NaiveDateTime>,
) -> Result<(), ApiErr> {
    let at = at.map(format_sqlite);
    sq_execute(conn, db::users::update_credits_reset_at(user_id, at.as_deref()))
        .map_err(ApiErr::from_db("update credits reset"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn setup() -> (tempfile::TempDir, crate::storage::Db) {
        let dir = tempfile::tempdir().unwrap();
        let db = crate::storage::init_db(dir.path()).unwrap();
        {
            let conn = db.conn();
            sq_execute(
                &conn,
                db::users::insert("u1", "a@example.com", "A", "h", "s", "SB00000001"),
            )
            .unwrap();
        }
        (dir, db)
    }

    fn ledger_reasons(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT reason FROM credit_ledger ORDER BY id")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_load_missing_user_is_not_found() {
        let (_dir, db) = setup();
        let err = load(&db.conn(), "nobody", Utc::now().naive_utc()).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_expired_trial_forfeits_credits_once() {
        let (_dir, db) = setup();
        let conn = db.conn();
        let now = Utc::now().naive_utc();
        let started = format_sqlite(now - Duration::hours(6));
        sq_execute(&conn, db::users::start_trial("u1", &started, 60)).unwrap();

        let account = load(&conn, "u1", now).unwrap();
        assert_eq!(account.wallet.trial, 0);
        assert_eq!(account.access_tier(now), Tier::Bronze);

        load(&conn, "u1", now).unwrap();
        assert_eq!(ledger_reasons(&conn), vec!["trial_expired"]);
    }

    #[test]
    fn test_paid_plan_refreshes_allowance_without_accumulating() {
        let (_dir, db) = setup();
        let conn = db.conn();
        let now = Utc::now().naive_utc();
        sq_execute(&conn, db::users::update_plan("u1", "silver")).unwrap();

        let account = load(&conn, "u1", now).unwrap();
        assert_eq!(account.wallet.monthly, 200);
        assert!(account.credits_reset_at.is_some_and(|at| at > now));

        // A month later the allowance is replaced, not added.
        let later = now + Duration::days(40);
        let account = load(&conn, "u1", later).unwrap();
        assert_eq!(account.wallet.monthly, 200);
        assert_eq!(ledger_reasons(&conn), vec!["monthly_refresh", "monthly_refresh"]);
    }
}
