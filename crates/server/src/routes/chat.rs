use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use soulbridge_api::{
    ChatHistoryQuery, ChatHistoryResponse, ChatMessage, ChatRequest, ChatResponse, OkResponse, db,
    service::{self, format_sqlite},
    tier,
};

use crate::account;
use crate::error::ApiErr;
use crate::responder::Responder;
use crate::routes::auth::AuthUser;
use crate::routes::companions::{selected_companion, unlocked_companion};
use crate::routes::now;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_row};

const DEFAULT_HISTORY: u32 = 50;
const MAX_HISTORY: u32 = 200;

/// POST /api/chat — send a message to a companion and get its reply.
pub async fn send(
    State(db): State<Db>,
    State(responder): State<Arc<dyn Responder>>,
    user: AuthUser,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiErr> {
    let now = now();
    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now)?;
    let message = service::validate_message(&req.message, tier::max_message_chars(account.plan))?;

    let companion_id = match req.companion.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_ascii_lowercase(),
        _ => selected_companion(&conn, &user.user_id)?,
    };
    let companion = unlocked_companion(&conn, &user.user_id, &companion_id)?;

    let nickname: String = sq_query_row(&conn, db::users::get_profile(&user.user_id), |row| {
        row.get(2)
    })
    .map_err(ApiErr::from_db("load nickname"))?;
    let reply = responder.reply(companion, &nickname, &message);

    let tx = conn
        .unchecked_transaction()
        .map_err(ApiErr::from_db("begin chat insert"))?;
    sq_execute(
        &tx,
        db::chat::insert(&user.user_id, companion.id, "user", &message),
    )
    .map_err(ApiErr::from_db("store message"))?;
    sq_execute(
        &tx,
        db::chat::insert(&user.user_id, companion.id, "companion", &reply),
    )
    .map_err(ApiErr::from_db("store reply"))?;
    tx.commit().map_err(ApiErr::from_db("commit chat insert"))?;

    Ok(Json(ChatResponse {
        companion: companion.id.to_string(),
        reply,
        created_at: format_sqlite(now),
    }))
}

/// GET /api/chat/history?companion=&limit= — oldest first.
pub async fn history(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<ChatHistoryQuery>,
) -> Result<Json<ChatHistoryResponse>, ApiErr> {
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);
    let companion = q.companion.as_deref().map(str::trim).filter(|c| !c.is_empty());

    let conn = db.conn();
    let mut messages = sq_query_map(
        &conn,
        db::chat::list_recent(&user.user_id, companion, u64::from(limit)),
        |row| {
            Ok(ChatMessage {
                id: row.get(0)?,
                companion: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        },
    )
    .map_err(ApiErr::from_db("list chat history"))?;
    messages.reverse();

    Ok(Json(ChatHistoryResponse { messages }))
}

/// DELETE /api/chat/history?companion= — clear one conversation, or all of them.
pub async fn clear_history(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<ChatHistoryQuery>,
) -> Result<Json<OkResponse>, ApiErr> {
    let companion = q.companion.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let conn = db.conn();
    sq_execute(&conn, db::chat::delete(&user.user_id, companion))
        .map_err(ApiErr::from_db("clear chat history"))?;
    Ok(Json(OkResponse { ok: true }))
}
