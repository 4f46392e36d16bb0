use axum::{
    Json,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, header, request::Parts},
};
use chrono::Utc;
use uuid::Uuid;

use soulbridge_api::{
    AuthRegisterRequest, AuthTokenResponse, ChangePasswordRequest, LoginRequest, LogoutRequest,
    OkResponse, RefreshRequest, crypto, db, referral,
    service::{self, TokenBundle},
};

use crate::error::ApiErr;
use crate::routes::{is_unique_violation, now, referrals};
use crate::storage::{Db, in_transaction, sq_execute, sq_query_row};
use crate::{AppConfig, Caches};

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// Authenticated user extracted from the `Authorization: Bearer <jwt>` header.
pub struct AuthUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        if config.jwt_secret.is_empty() {
            return Err(ApiErr::unauthorized("authentication is not configured"));
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiErr::unauthorized("missing or invalid Authorization header"))?;

        let user_id = crypto::verify_jwt(token.trim(), &config.jwt_secret, now_unix())?;
        Ok(AuthUser { user_id })
    }
}

fn now_unix() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

fn require_jwt_secret(config: &AppConfig) -> Result<(), ApiErr> {
    if config.jwt_secret.is_empty() {
        return Err(ApiErr::unauthorized("authentication is not configured"));
    }
    Ok(())
}

/// Persist the refresh token half of a bundle and hand back the response.
fn issue_tokens(
    conn: &rusqlite::Connection,
    config: &AppConfig,
    user_id: &str,
    nickname: &str,
) -> Result<AuthTokenResponse, ApiErr> {
    let TokenBundle {
        token_hash,
        token_id,
        expires_at,
        response,
    } = service::prepare_token_bundle(&config.jwt_secret, user_id, nickname, now_unix())?;
    sq_execute(
        conn,
        db::users::insert_refresh_token(&token_id, user_id, &token_hash, &expires_at),
    )
    .map_err(ApiErr::from_db("insert refresh token"))?;
    Ok(response)
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// POST /api/register — create an account, optionally under a referral code.
pub async fn register(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    State(caches): State<Caches>,
    Json(req): Json<AuthRegisterRequest>,
) -> Result<(StatusCode, Json<AuthTokenResponse>), ApiErr> {
    if !config.registration_open {
        return Err(ApiErr::forbidden("registration is currently closed"));
    }
    require_jwt_secret(&config)?;

    let email = service::validate_email(&req.email)?;
    service::validate_password(&req.password)?;
    let nickname = service::validate_nickname(&req.nickname)?;
    let referral_code = req
        .referral_code
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(referral::normalize_code)
        .transpose()?;

    let (password_hash, password_salt) = crypto::hash_password(&req.password)?;
    let user_id = Uuid::new_v4().to_string();
    let now = now();

    let conn = db.conn();

    let exists: bool = sq_query_row(&conn, db::users::email_exists(&email), |row| row.get(0))
        .map_err(ApiErr::from_db("check email"))?;
    if exists {
        return Err(ApiErr::conflict("email already registered"));
    }

    // Resolve the referrer before creating anything so a bad code leaves no account behind.
    let referrer = match referral_code.as_deref() {
        Some(code) => {
            let owner = referrals::find_code_owner(&conn, code)?;
            referral::check_referral(
                &referral::Party {
                    user_id: &owner.user_id,
                    email: &owner.email,
                },
                &referral::Party {
                    user_id: &user_id,
                    email: &email,
                },
            )?;
            Some(owner)
        }
        None => None,
    };

    // Account row, referral bonus and first refresh token commit together.
    let own_code = referral::generate_code();
    let response = in_transaction(&conn, |tx| {
        sq_execute(
            tx,
            db::users::insert(
                &user_id,
                &email,
                &nickname,
                &password_hash,
                &password_salt,
                &own_code,
            ),
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiErr::conflict("email already registered")
            } else {
                ApiErr::from_db("insert user")(e)
            }
        })?;

        if let Some(owner) = &referrer {
            referrals::record(tx, owner, &user_id, now)?;
        }
        issue_tokens(tx, &config, &user_id, &nickname)
    })?;
    if let Some(owner) = &referrer {
        caches.forget_user(&owner.user_id);
    }

    tracing::info!(user_id = %user_id, "registered new user");
    Ok((StatusCode::CREATED, Json(response)))
}

// ---------------------------------------------------------------------------
// Login / refresh / logout
// ---------------------------------------------------------------------------

/// POST /api/login — email + password.
pub async fn login(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, ApiErr> {
    require_jwt_secret(&config)?;
    let email = req.email.trim().to_lowercase();

    let found = {
        let conn = db.conn();
        sq_query_row(&conn, db::users::get_by_email_for_login(&email), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
    };

    let (user_id, nickname, hash, salt) = match found {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(ApiErr::unauthorized("invalid email or password"));
        }
        Err(e) => return Err(ApiErr::from_db("login lookup")(e)),
    };

    if !crypto::verify_password(&req.password, &hash, &salt) {
        return Err(ApiErr::unauthorized("invalid email or password"));
    }

    let conn = db.conn();
    let response = issue_tokens(&conn, &config, &user_id, &nickname)?;
    Ok(Json(response))
}

/// POST /api/refresh — rotate a refresh token.
pub async fn refresh(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthTokenResponse>, ApiErr> {
    require_jwt_secret(&config)?;
    let token_hash = crypto::hash_token(&req.refresh_token);

    let conn = db.conn();
    let found = sq_query_row(&conn, db::users::lookup_refresh_token(&token_hash), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    });
    let (token_id, user_id, expires_at, nickname) = match found {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(ApiErr::unauthorized("invalid refresh token"));
        }
        Err(e) => return Err(ApiErr::from_db("refresh lookup")(e)),
    };

    let revoke = |conn: &rusqlite::Connection| {
        sq_execute(conn, db::users::delete_refresh_token_by_id(&token_id))
            .map_err(ApiErr::from_db("delete refresh token"))
    };

    let expired = service::parse_sqlite(&expires_at).is_none_or(|at| at <= now());
    if expired {
        revoke(&conn)?;
        return Err(ApiErr::unauthorized("refresh token expired"));
    }

    let response = in_transaction(&conn, |tx| {
        revoke(tx)?;
        issue_tokens(tx, &config, &user_id, &nickname)
    })?;
    Ok(Json(response))
}

/// POST /api/logout — revoke a refresh token.
pub async fn logout(
    State(db): State<Db>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    let token_hash = crypto::hash_token(&req.refresh_token);
    let conn = db.conn();
    sq_execute(&conn, db::users::delete_refresh_token(&token_hash))
        .map_err(ApiErr::from_db("logout"))?;
    Ok(Json(OkResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Change password
// ---------------------------------------------------------------------------

/// PUT /api/password — requires the current password; revokes all refresh tokens.
pub async fn change_password(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    service::validate_password(&req.new_password)?;

    let found = {
        let conn = db.conn();
        sq_query_row(&conn, db::users::get_password_fields(&user.user_id), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
    };
    let (hash, salt) = match found {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(ApiErr::not_found("user not found"));
        }
        Err(e) => return Err(ApiErr::from_db("password lookup")(e)),
    };

    if !crypto::verify_password(&req.current_password, &hash, &salt) {
        return Err(ApiErr::unauthorized("current password is incorrect"));
    }

    let (new_hash, new_salt) = crypto::hash_password(&req.new_password)?;
    let conn = db.conn();
    in_transaction(&conn, |tx| {
        sq_execute(
            tx,
            db::users::update_password(&user.user_id, &new_hash, &new_salt),
        )
        .map_err(ApiErr::from_db("update password"))?;
        sq_execute(tx, db::users::delete_refresh_tokens_for_user(&user.user_id))
            .map_err(ApiErr::from_db("revoke refresh tokens"))?;
        Ok(())
    })?;

    tracing::info!(user_id = %user.user_id, "password changed");
    Ok(Json(OkResponse { ok: true }))
}
