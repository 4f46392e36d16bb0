//! Referral codes, fraud checks, and milestone rewards.

use chrono::{Duration, NaiveDateTime};

use crate::ServiceError;

/// Credits added to the referrer's purchased pool per successful referral.
pub const REFERRAL_BONUS_CREDITS: i64 = 25;

/// Existing users may claim a referral code this long after signing up.
pub const CLAIM_WINDOW_DAYS: i64 = 7;

/// `(referrals needed, companion id)` pairs, ascending.
pub const MILESTONES: &[(u32, &str)] = &[(2, "blayzike"), (5, "blazelian"), (8, "nyxara")];

/// Generate a referral code: `SB` + 8 uppercase hex characters.
pub fn generate_code() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("SB{}", hex[..8].to_ascii_uppercase())
}

/// Normalize a user-supplied code for lookup.
pub fn normalize_code(code: &str) -> Result<String, ServiceError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 10 || !code.starts_with("SB") {
        return Err(ServiceError::NotFound("referral code not found".into()));
    }
    Ok(code)
}

/// Canonical mailbox identity used to catch alias self-referrals:
/// lowercased, `+tag` removed, and dots dropped for Gmail.
pub fn canonical_email(email: &str) -> String {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return email;
    };
    let local = local.split('+').next().unwrap_or(local);
    let local = if domain == "gmail.com" || domain == "googlemail.com" {
        local.replace('.', "")
    } else {
        local.to_string()
    };
    let domain = if domain == "googlemail.com" { "gmail.com" } else { domain };
    format!("{local}@{domain}")
}

/// The two parties of a referral as far as fraud checks care.
pub struct Party<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
}

/// Reject self-referrals, including the same mailbox under an alias.
/// Duplicates are caught by the UNIQUE constraint on `referrals.referee_id`.
pub fn check_referral(referrer: &Party<'_>, referee: &Party<'_>) -> Result<(), ServiceError> {
    if referrer.user_id == referee.user_id {
        return Err(ServiceError::BadRequest("cannot refer yourself".into()));
    }
    if canonical_email(referrer.email) == canonical_email(referee.email) {
        return Err(ServiceError::BadRequest(
            "referral rejected: accounts share a mailbox".into(),
        ));
    }
    Ok(())
}

pub fn check_claim_window(
    signed_up_at: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<(), ServiceError> {
    if now - signed_up_at > Duration::days(CLAIM_WINDOW_DAYS) {
        return Err(ServiceError::BadRequest(format!(
            "referral codes can only be claimed within {CLAIM_WINDOW_DAYS} days of sign-up"
        )));
    }
    Ok(())
}

/// Companion ids earned with `count` referrals.
pub fn unlocked_rewards(count: u32) -> Vec<String> {
    MILESTONES
        .iter()
        .filter(|(needed, _)| count >= *needed)
        .map(|(_, id)| id.to_string())
        .collect()
}

/// Next milestone still ahead of `count`, if any.
pub fn next_milestone(count: u32) -> Option<(u32, &'static str)> {
    MILESTONES.iter().copied().find(|(needed, _)| count < *needed)
}

pub fn share_url(base_url: &str, code: &str) -> String {
    format!("{}/register?ref={code}", base_url.trim_end_matches('/'))
}
