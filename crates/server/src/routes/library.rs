use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rusqlite::Row;
use uuid::Uuid;

use soulbridge_api::{
    CreateSongRequest, ListSongsResponse, OkResponse, SongKind, SongResponse, db, service, tier,
};

use crate::account;
use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::routes::now;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_row};

const MAX_TEXT_CHARS: usize = 10_000;

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<SongResponse> {
    let kind: String = row.get(2)?;
    Ok(SongResponse {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: SongKind::from_db(&kind),
        prompt: row.get(3)?,
        lyrics: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, ApiErr> {
    let Some(text) = value.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ApiErr::bad_request(format!(
            "{field} must be at most {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(Some(text.to_string()))
}

/// GET /api/library — newest first.
pub async fn list(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListSongsResponse>, ApiErr> {
    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now())?;
    let songs = sq_query_map(&conn, db::songs::list_for_user(&user.user_id), song_from_row)
        .map_err(ApiErr::from_db("list songs"))?;
    Ok(Json(ListSongsResponse {
        songs,
        capacity: tier::library_capacity(account.plan),
    }))
}

/// POST /api/library — save a song, within the plan's capacity.
pub async fn create(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateSongRequest>,
) -> Result<(StatusCode, Json<SongResponse>), ApiErr> {
    let title = service::validate_song_title(&req.title)?;
    let prompt = optional_text("prompt", req.prompt.as_deref())?;
    let lyrics = optional_text("lyrics", req.lyrics.as_deref())?;

    let conn = db.conn();
    let account = account::load(&conn, &user.user_id, now())?;
    if let Some(capacity) = tier::library_capacity(account.plan) {
        let stored: i64 = sq_query_row(&conn, db::songs::count_for_user(&user.user_id), |row| {
            row.get(0)
        })
        .map_err(ApiErr::from_db("count songs"))?;
        if stored >= i64::from(capacity) {
            return Err(ApiErr::forbidden(format!(
                "library is full: the {} plan keeps {capacity} songs",
                account.plan
            )));
        }
    }

    let id = Uuid::new_v4().to_string();
    sq_execute(
        &conn,
        db::songs::insert(
            &id,
            &user.user_id,
            &title,
            req.kind.as_str(),
            prompt.as_deref(),
            lyrics.as_deref(),
        ),
    )
    .map_err(ApiErr::from_db("insert song"))?;

    let song = sq_query_row(&conn, db::songs::get(&id, &user.user_id), song_from_row)
        .map_err(ApiErr::from_db("load song"))?;
    Ok((StatusCode::CREATED, Json(song)))
}

/// DELETE /api/library/{id} — owner only; anyone else sees 404.
pub async fn remove(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let deleted = sq_execute(&conn, db::songs::delete(&id, &user.user_id))
        .map_err(ApiErr::from_db("delete song"))?;
    if deleted == 0 {
        return Err(ApiErr::not_found("song not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}
