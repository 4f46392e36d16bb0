//! Password and token primitives behind account sign-in.
//!
//! Passwords are PBKDF2-SHA256 (600k iterations, random 16-byte salt).
//! Access tokens are HS256 JWTs carrying only `sub`, `iat`, and `exp`.
//! Refresh tokens are random and stored as SHA-256 digests.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::ServiceError;

const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

// ── Password hashing ────────────────────────────────────────────────────────

/// Hash a password with PBKDF2-SHA256. Returns `(hash_hex, salt_hex)`.
pub fn hash_password(password: &str) -> Result<(String, String), ServiceError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    Ok((hex::encode(hash), hex::encode(salt)))
}

/// Verify a password against a stored hash and salt (both hex-encoded).
pub fn verify_password(password: &str, hash_hex: &str, salt_hex: &str) -> bool {
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash_hex) else {
        return false;
    };

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    constant_time_eq(&hash, &expected)
}

// ── Access tokens (HS256 JWT) ───────────────────────────────────────────────

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Access token lifetime: 1 hour.
pub const JWT_EXPIRY_SECS: u64 = 3600;

/// Refresh token lifetime: 7 days.
pub const REFRESH_EXPIRY_SECS: u64 = 7 * 24 * 3600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: u64,
    exp: u64,
}

fn unauthorized(msg: &str) -> ServiceError {
    ServiceError::Unauthorized(msg.to_string())
}

/// Sign an access token for `user_id`, valid for [`JWT_EXPIRY_SECS`].
pub fn sign_jwt(user_id: &str, secret: &str, now_unix: u64) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now_unix,
        exp: now_unix + JWT_EXPIRY_SECS,
    };
    // Serializing a struct of plain strings and integers cannot fail.
    let payload = serde_json::to_vec(&claims).unwrap_or_default();

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(JWT_HEADER),
        URL_SAFE_NO_PAD.encode(payload)
    );
    let signature = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
}

/// Check signature and expiry, returning the user id from `sub`.
pub fn verify_jwt(token: &str, secret: &str, now_unix: u64) -> Result<String, ServiceError> {
    let (signing_input, sig_b64) = token
        .rsplit_once('.')
        .ok_or_else(|| unauthorized("invalid token format"))?;
    let (_, payload_b64) = signing_input
        .split_once('.')
        .filter(|(_, payload)| !payload.contains('.'))
        .ok_or_else(|| unauthorized("invalid token format"))?;

    let signature = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| unauthorized("invalid token signature encoding"))?;
    let expected = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    if !constant_time_eq(&expected, &signature) {
        return Err(unauthorized("invalid token signature"));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| unauthorized("invalid token payload encoding"))?;
    let claims: Claims =
        serde_json::from_slice(&payload).map_err(|_| unauthorized("invalid token payload"))?;

    if now_unix > claims.exp {
        return Err(unauthorized("token expired"));
    }
    Ok(claims.sub)
}

/// Generate a random refresh token. Returns hex-encoded.
pub fn generate_token() -> Result<String, ServiceError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;
    Ok(hex::encode(bytes))
}

/// Hash a token with SHA-256 for storage. Returns hex-encoded.
pub fn hash_token(token: &str) -> String {
    use sha2::Digest;
    let hash = sha2::Sha256::digest(token.as_bytes());
    hex::encode(hash)
}

// ── Internal ────────────────────────────────────────────────────────────────

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC takes keys of any length.
    match Hmac::<Sha256>::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_password_round_trip() {
        let (hash, salt) = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash, &salt));
        assert!(!verify_password("hunter23", &hash, &salt));
        assert!(!verify_password("hunter22", "zz", &salt));
    }

    #[test]
    fn test_jwt_valid_and_expired() {
        let token = sign_jwt("user-1", SECRET, 1_000);
        assert_eq!(verify_jwt(&token, SECRET, 1_500).unwrap(), "user-1");

        let err = verify_jwt(&token, SECRET, 1_000 + JWT_EXPIRY_SECS + 1).unwrap_err();
        assert_eq!(err.message(), "token expired");
    }

    #[test]
    fn test_jwt_rejects_wrong_secret_and_garbage() {
        let token = sign_jwt("user-1", SECRET, 1_000);
        assert!(verify_jwt(&token, "other", 1_000).is_err());
        assert!(verify_jwt("not-a-jwt", SECRET, 1_000).is_err());
    }

    #[test]
    fn test_hash_token_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(generate_token().unwrap().len(), 64);
    }
}
