//! Shared business logic — framework-agnostic pure functions.
//!
//! Route handlers stay thin adapters: they validate through these helpers,
//! then perform the DB reads/writes.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{AuthTokenResponse, ServiceError};

/// Timestamp format used for every TEXT datetime column.
pub const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

// ─── Validation ─────────────────────────────────────────────────────────────

/// Validate and normalize an email address. Returns the lowercased, trimmed email.
pub fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim().to_lowercase();
    let valid_shape = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid_shape || email.len() > 254 {
        return Err(ServiceError::BadRequest("invalid email address".into()));
    }
    Ok(email)
}

/// Validate a password (8-128 characters).
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    let len = password.chars().count();
    if len < 8 {
        return Err(ServiceError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }
    if len > 128 {
        return Err(ServiceError::BadRequest(
            "password must be at most 128 characters".into(),
        ));
    }
    Ok(())
}

/// Validate and normalize a user nickname. Returns the trimmed nickname.
pub fn validate_nickname(nickname: &str) -> Result<String, ServiceError> {
    let trimmed = nickname.trim().to_string();
    if trimmed.is_empty() || trimmed.chars().count() > 64 {
        return Err(ServiceError::BadRequest(
            "nickname must be 1-64 characters".into(),
        ));
    }
    Ok(trimmed)
}

/// Validate a chat message against the plan's length cap.
pub fn validate_message(message: &str, max_chars: usize) -> Result<String, ServiceError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest("message must not be empty".into()));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ServiceError::BadRequest(format!(
            "message exceeds {max_chars} characters for your plan"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_song_title(title: &str) -> Result<String, ServiceError> {
    let trimmed = title.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 120 {
        return Err(ServiceError::BadRequest("title must be 1-120 characters".into()));
    }
    Ok(trimmed.to_string())
}

// ─── Time helpers ───────────────────────────────────────────────────────────

pub fn format_sqlite(at: NaiveDateTime) -> String {
    at.format(SQLITE_DATETIME).to_string()
}

/// Parse a TEXT datetime column. Accepts the SQLite default format and RFC 3339.
pub fn parse_sqlite(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, SQLITE_DATETIME)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).naive_utc())
        })
}

/// UTC calendar day used as the usage counter key.
pub fn usage_date(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%d").to_string()
}

// ─── Token Bundle ───────────────────────────────────────────────────────────

/// Everything needed to persist a refresh token and answer an auth request.
/// The caller only performs the DB INSERT.
pub struct TokenBundle {
    /// SHA-256 hash of the refresh token (stored in DB).
    pub token_hash: String,
    /// UUID primary key for the refresh_tokens row.
    pub token_id: String,
    /// Refresh token expiry (DB column value).
    pub expires_at: String,
    /// Ready-to-return API response.
    pub response: AuthTokenResponse,
}

/// Build a [`TokenBundle`] with a fresh JWT and refresh token.
pub fn prepare_token_bundle(
    jwt_secret: &str,
    user_id: &str,
    nickname: &str,
    now_unix: u64,
) -> Result<TokenBundle, ServiceError> {
    use crate::crypto;

    let access_token = crypto::sign_jwt(user_id, jwt_secret, now_unix);
    let refresh_token = crypto::generate_token()?;
    let token_hash = crypto::hash_token(&refresh_token);
    let token_id = uuid::Uuid::new_v4().to_string();

    let base = DateTime::from_timestamp(now_unix as i64, 0)
        .ok_or_else(|| ServiceError::Internal("invalid timestamp".into()))?;
    let expires_at = base
        .checked_add_signed(chrono::Duration::seconds(
            crypto::REFRESH_EXPIRY_SECS as i64,
        ))
        .ok_or_else(|| ServiceError::Internal("timestamp overflow".into()))?
        .format(SQLITE_DATETIME)
        .to_string();

    Ok(TokenBundle {
        token_hash,
        token_id,
        expires_at,
        response: AuthTokenResponse {
            access_token,
            refresh_token,
            expires_in: crypto::JWT_EXPIRY_SECS,
            user_id: user_id.to_string(),
            nickname: nickname.to_string(),
        },
    })
}
