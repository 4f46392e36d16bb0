//! Song library builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Songs;

pub fn insert(
    id: &str,
    user_id: &str,
    title: &str,
    kind: &str,
    prompt: Option<&str>,
    lyrics: Option<&str>,
) -> Built {
    Query::insert()
        .into_table(Songs::Table)
        .columns([
            Songs::Id,
            Songs::UserId,
            Songs::Title,
            Songs::Kind,
            Songs::Prompt,
            Songs::Lyrics,
        ])
        .values_panic([
            id.into(),
            user_id.into(),
            title.into(),
            kind.into(),
            prompt.map(|s| s.to_string()).into(),
            lyrics.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

/// (id, title, kind, prompt, lyrics, created_at), newest first.
pub fn list_for_user(user_id: &str) -> Built {
    Query::select()
        .columns([
            Songs::Id,
            Songs::Title,
            Songs::Kind,
            Songs::Prompt,
            Songs::Lyrics,
            Songs::CreatedAt,
        ])
        .from(Songs::Table)
        .and_where(Expr::col(Songs::UserId).eq(user_id))
        .order_by(Songs::CreatedAt, Order::Desc)
        .order_by_expr(Expr::cust("rowid"), Order::Desc)
        .build(SqliteQueryBuilder)
}

pub fn get(id: &str, user_id: &str) -> Built {
    Query::select()
        .columns([
            Songs::Id,
            Songs::Title,
            Songs::Kind,
            Songs::Prompt,
            Songs::Lyrics,
            Songs::CreatedAt,
        ])
        .from(Songs::Table)
        .and_where(Expr::col(Songs::Id).eq(id))
        .and_where(Expr::col(Songs::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn count_for_user(user_id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Songs::Table)
        .and_where(Expr::col(Songs::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Delete only when owned by `user_id`.
pub fn delete(id: &str, user_id: &str) -> Built {
    Query::delete()
        .from_table(Songs::Table)
        .and_where(Expr::col(Songs::Id).eq(id))
        .and_where(Expr::col(Songs::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}
