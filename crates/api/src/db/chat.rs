//! Companion chat history builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::ChatMessages;

pub fn insert(user_id: &str, companion: &str, role: &str, content: &str) -> Built {
    Query::insert()
        .into_table(ChatMessages::Table)
        .columns([
            ChatMessages::UserId,
            ChatMessages::Companion,
            ChatMessages::Role,
            ChatMessages::Content,
        ])
        .values_panic([user_id.into(), companion.into(), role.into(), content.into()])
        .build(SqliteQueryBuilder)
}

/// Newest `limit` messages (id, companion, role, content, created_at), newest first.
/// Callers reverse the rows for display.
pub fn list_recent(user_id: &str, companion: Option<&str>, limit: u64) -> Built {
    let mut q = Query::select();
    q.columns([
        ChatMessages::Id,
        ChatMessages::Companion,
        ChatMessages::Role,
        ChatMessages::Content,
        ChatMessages::CreatedAt,
    ])
    .from(ChatMessages::Table)
    .and_where(Expr::col(ChatMessages::UserId).eq(user_id));
    if let Some(companion) = companion {
        q.and_where(Expr::col(ChatMessages::Companion).eq(companion));
    }
    q.order_by(ChatMessages::Id, Order::Desc)
        .limit(limit)
        .build(SqliteQueryBuilder)
}

pub fn delete(user_id: &str, companion: Option<&str>) -> Built {
    let mut q = Query::delete();
    q.from_table(ChatMessages::Table)
        .and_where(Expr::col(ChatMessages::UserId).eq(user_id));
    if let Some(companion) = companion {
        q.and_where(Expr::col(ChatMessages::Companion).eq(companion));
    }
    q.build(SqliteQueryBuilder)
}
