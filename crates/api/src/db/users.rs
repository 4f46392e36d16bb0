//! User / auth query builders.

use sea_query::{Asterisk, Expr, Func, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{RefreshTokens, Users};
use crate::Wallet;

/// Columns loaded by [`get_account`], in order.
pub const ACCOUNT_COLUMNS: [Users; 10] = [
    Users::Id,
    Users::Email,
    Users::Plan,
    Users::MonthlyCredits,
    Users::PurchasedCredits,
    Users::TrialCredits,
    Users::CreditsResetAt,
    Users::TrialStartedAt,
    Users::TrialUsed,
    Users::CreatedAt,
];

// ── User lookups ───────────────────────────────────────────────────────────

/// Profile fields: id, email, nickname, plan, selected_companion, referral_code, created_at.
pub fn get_profile(user_id: &str) -> Built {
    Query::select()
        .columns([
            Users::Id,
            Users::Email,
            Users::Nickname,
            Users::Plan,
            Users::SelectedCompanion,
            Users::ReferralCode,
            Users::CreatedAt,
        ])
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Plan, wallet, and trial columns (see [`ACCOUNT_COLUMNS`]).
pub fn get_account(user_id: &str) -> Built {
    Query::select()
        .columns(ACCOUNT_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Find user by email for login (returns id, nickname, password_hash, password_salt).
pub fn get_by_email_for_login(email: &str) -> Built {
    Query::select()
        .columns([
            Users::Id,
            Users::Nickname,
            Users::PasswordHash,
            Users::PasswordSalt,
        ])
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

/// Check email existence.
pub fn email_exists(email: &str) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

/// Resolve a referral code to the owner's (id, email, referral_code).
pub fn get_by_referral_code(code: &str) -> Built {
    Query::select()
        .columns([Users::Id, Users::Email, Users::ReferralCode])
        .from(Users::Table)
        .and_where(Expr::col(Users::ReferralCode).eq(code))
        .build(SqliteQueryBuilder)
}

pub fn get_password_fields(user_id: &str) -> Built {
    Query::select()
        .columns([Users::PasswordHash, Users::PasswordSalt])
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

// ── User inserts ───────────────────────────────────────────────────────────

pub fn insert(
    id: &str,
    email: &str,
    nickname: &str,
    password_hash: &str,
    password_salt: &str,
    referral_code: &str,
) -> Built {
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Id,
            Users::Email,
            Users::Nickname,
            Users::PasswordHash,
            Users::PasswordSalt,
            Users::ReferralCode,
        ])
        .values_panic([
            id.into(),
            email.into(),
            nickname.into(),
            password_hash.into(),
            password_salt.into(),
            referral_code.into(),
        ])
        .build(SqliteQueryBuilder)
}

// ── User updates ───────────────────────────────────────────────────────────

pub fn update_password(user_id: &str, password_hash: &str, password_salt: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::PasswordHash, password_hash)
        .value(Users::PasswordSalt, password_salt)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Overwrite all three credit pools.
pub fn update_wallet(user_id: &str, wallet: &Wallet) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::TrialCredits, wallet.trial)
        .value(Users::MonthlyCredits, wallet.monthly)
        .value(Users::PurchasedCredits, wallet.purchased)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn update_credits_reset_at(user_id: &str, reset_at: Option<&str>) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::CreditsResetAt, reset_at.map(|s| s.to_string()))
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn update_plan(user_id: &str, plan: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::Plan, plan)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Mark the trial as used and load the trial pool.
pub fn start_trial(user_id: &str, started_at: &str, trial_credits: i64) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::TrialStartedAt, started_at)
        .value(Users::TrialUsed, 1)
        .value(Users::TrialCredits, trial_credits)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .and_where(Expr::col(Users::TrialUsed).eq(0))
        .build(SqliteQueryBuilder)
}

pub fn update_selected_companion(user_id: &str, companion: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::SelectedCompanion, companion)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

// ── Refresh tokens ─────────────────────────────────────────────────────────

pub fn insert_refresh_token(id: &str, user_id: &str, token_hash: &str, expires_at: &str) -> Built {
    Query::insert()
        .into_table(RefreshTokens::Table)
        .columns([
            RefreshTokens::Id,
            RefreshTokens::UserId,
            RefreshTokens::TokenHash,
            RefreshTokens::ExpiresAt,
        ])
        .values_panic([
            id.into(),
            user_id.into(),
            token_hash.into(),
            expires_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Lookup refresh token with user join (id, user_id, expires_at, nickname).
pub fn lookup_refresh_token(token_hash: &str) -> Built {
    Query::select()
        .column((RefreshTokens::Table, RefreshTokens::Id))
        .column((RefreshTokens::Table, RefreshTokens::UserId))
        .column((RefreshTokens::Table, RefreshTokens::ExpiresAt))
        .column((Users::Table, Users::Nickname))
        .from(RefreshTokens::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id))
                .equals((RefreshTokens::Table, RefreshTokens::UserId)),
        )
        .and_where(Expr::col((RefreshTokens::Table, RefreshTokens::TokenHash)).eq(token_hash))
        .build(SqliteQueryBuilder)
}

pub fn delete_refresh_token(token_hash: &str) -> Built {
    Query::delete()
        .from_table(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::TokenHash).eq(token_hash))
        .build(SqliteQueryBuilder)
}

pub fn delete_refresh_token_by_id(id: &str) -> Built {
    Query::delete()
        .from_table(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Drop every refresh token of a user (password change).
pub fn delete_refresh_tokens_for_user(user_id: &str) -> Built {
    Query::delete()
        .from_table(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_trial_is_guarded() {
        let (sql, values) = start_trial("u1", "2026-01-01 00:00:00", 60);
        assert!(sql.contains("\"trial_used\" = ?"));
        assert_eq!(values.0.len(), 5);
    }

    #[test]
    fn test_account_columns_order() {
        let (sql, _) = get_account("u1");
        assert!(sql.starts_with("SELECT \"id\", \"email\", \"plan\", \"monthly_credits\""));
    }
}
