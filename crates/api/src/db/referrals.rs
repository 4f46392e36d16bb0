//! Referral query builders.

use sea_query::{Asterisk, Expr, Func, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Referrals, Users};

pub fn insert(id: &str, referrer_id: &str, referee_id: &str, code: &str) -> Built {
    Query::insert()
        .into_table(Referrals::Table)
        .columns([
            Referrals::Id,
            Referrals::ReferrerId,
            Referrals::RefereeId,
            Referrals::Code,
        ])
        .values_panic([id.into(), referrer_id.into(), referee_id.into(), code.into()])
        .build(SqliteQueryBuilder)
}

pub fn count_for_referrer(referrer_id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Referrals::Table)
        .and_where(Expr::col(Referrals::ReferrerId).eq(referrer_id))
        .build(SqliteQueryBuilder)
}

/// Nickname of whoever referred `referee_id`.
pub fn referrer_nickname(referee_id: &str) -> Built {
    Query::select()
        .column((Users::Table, Users::Nickname))
        .from(Referrals::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((Referrals::Table, Referrals::ReferrerId)),
        )
        .and_where(Expr::col((Referrals::Table, Referrals::RefereeId)).eq(referee_id))
        .build(SqliteQueryBuilder)
}
