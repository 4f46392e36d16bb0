pub mod admin;
pub mod auth;
pub mod chat;
pub mod companions;
pub mod credits;
pub mod docs;
pub mod health;
pub mod library;
pub mod oracle;
pub mod profile;
pub mod referrals;
pub mod trial;
pub mod usage;

use chrono::{NaiveDateTime, Utc};

/// Current UTC time as stored in TEXT columns.
pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
