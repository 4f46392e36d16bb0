//! Daily feature usage counters.

use sea_query::{Expr, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::FeatureUsage;

/// Today's count for one feature.
pub fn get_count(user_id: &str, feature: &str, usage_date: &str) -> Built {
    Query::select()
        .column(FeatureUsage::Count)
        .from(FeatureUsage::Table)
        .and_where(Expr::col(FeatureUsage::UserId).eq(user_id))
        .and_where(Expr::col(FeatureUsage::Feature).eq(feature))
        .and_where(Expr::col(FeatureUsage::UsageDate).eq(usage_date))
        .build(SqliteQueryBuilder)
}

/// All of a user's counters for a day (feature, count).
pub fn list_for_day(user_id: &str, usage_date: &str) -> Built {
    Query::select()
        .columns([FeatureUsage::Feature, FeatureUsage::Count])
        .from(FeatureUsage::Table)
        .and_where(Expr::col(FeatureUsage::UserId).eq(user_id))
        .and_where(Expr::col(FeatureUsage::UsageDate).eq(usage_date))
        .build(SqliteQueryBuilder)
}

/// Add one use, creating the row on the first use of the day.
pub fn increment(user_id: &str, feature: &str, usage_date: &str) -> Built {
    // ON CONFLICT ... DO UPDATE with an expression — kept as raw SQL
    let sql = concat!(
        "INSERT INTO \"feature_usage\" (\"user_id\", \"feature\", \"usage_date\", \"count\") ",
        "VALUES (?, ?, ?, 1) ",
        "ON CONFLICT (\"user_id\", \"feature\", \"usage_date\") ",
        "DO UPDATE SET \"count\" = \"count\" + 1",
    )
    .to_string();
    let values = sea_query::Values(vec![user_id.into(), feature.into(), usage_date.into()]);
    (sql, values)
}
