//! Credit ledger query builders. Balances live on `users`; the ledger is the
//! append-only history of every change.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::CreditLedger;

pub fn insert_entry(
    user_id: &str,
    delta: i64,
    reason: &str,
    feature: Option<&str>,
    balance_after: i64,
) -> Built {
    Query::insert()
        .into_table(CreditLedger::Table)
        .columns([
            CreditLedger::UserId,
            CreditLedger::Delta,
            CreditLedger::Reason,
            CreditLedger::Feature,
            CreditLedger::BalanceAfter,
        ])
        .values_panic([
            user_id.into(),
            delta.into(),
            reason.into(),
            feature.map(|s| s.to_string()).into(),
            balance_after.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Most recent entries first (id, delta, reason, feature, balance_after, created_at).
pub fn list_recent(user_id: &str, limit: u64) -> Built {
    Query::select()
        .columns([
            CreditLedger::Id,
            CreditLedger::Delta,
            CreditLedger::Reason,
            CreditLedger::Feature,
            CreditLedger::BalanceAfter,
            CreditLedger::CreatedAt,
        ])
        .from(CreditLedger::Table)
        .and_where(Expr::col(CreditLedger::UserId).eq(user_id))
        .order_by(CreditLedger::Id, Order::Desc)
        .limit(limit)
        .build(SqliteQueryBuilder)
}
