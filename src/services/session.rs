//! Stateless admin sessions held in an encrypted cookie.
//!
//! The cookie payload is sealed with AES-256-GCM by the private cookie jar,
//! so a client can neither read nor forge it. Expiry is checked server side
//! against the embedded timestamp as well as via the cookie `Max-Age`.

use serde::{Deserialize, Serialize};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies, Key};
use tracing::debug;

use crate::constants::session::{COOKIE_NAME, SECRET_LEN, TTL_HOURS};
use crate::db::AdminUser;

/// Identity recovered from a valid session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    user_id: i32,
    username: String,
    expires_at: i64,
}

#[derive(Clone)]
pub struct SessionManager {
    key: Key,
    secure: bool,
}

impl SessionManager {
    /// Without a secret a random key is used, so sessions end with the process.
    #[must_use]
    pub fn new(secret: Option<&str>, secure: bool) -> Self {
        let key = secret
            .filter(|s| !s.is_empty())
            .map_or_else(Key::generate, |s| Key::derive_from(&secret_bytes(s)));

        Self { key, secure }
    }

    /// Sets the session cookie, replacing any previous one.
    pub fn issue(&self, cookies: &Cookies, user: &AdminUser) {
        let claims = SessionClaims {
            user_id: user.id,
            username: user.username.clone(),
            expires_at: (chrono::Utc::now() + chrono::Duration::hours(TTL_HOURS)).timestamp(),
        };

        // Serializing a struct of plain fields cannot fail.
        let payload = serde_json::to_string(&claims).unwrap_or_default();

        let cookie = Cookie::build((COOKIE_NAME, payload))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::hours(TTL_HOURS))
            .build();

        cookies.private(&self.key).add(cookie);
    }

    /// Any failure (missing, tampered, malformed, expired) reads as logged out.
    #[must_use]
    pub fn resolve(&self, cookies: &Cookies) -> Option<AdminIdentity> {
        let cookie = cookies.private(&self.key).get(COOKIE_NAME)?;

        let claims: SessionClaims = match serde_json::from_str(cookie.value()) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Discarding malformed session payload");
                return None;
            }
        };

        if claims.expires_at <= chrono::Utc::now().timestamp() {
            debug!(user_id = claims.user_id, "Session expired");
            return None;
        }

        Some(AdminIdentity {
            user_id: claims.user_id,
            username: claims.username,
        })
    }

    pub fn invalidate(&self, cookies: &Cookies) {
        let cookie = Cookie::build((COOKIE_NAME, "")).path("/").build();
        cookies.private(&self.key).remove(cookie);
    }
}

/// Hex secrets of at least 32 characters are decoded, anything else is used
/// as raw bytes. The result is zero padded or truncated to the secret length
/// and only ever used as HKDF input.
fn secret_bytes(secret: &str) -> [u8; SECRET_LEN] {
    let raw = if secret.len() >= 32 && secret.len() % 2 == 0 {
        hex::decode(secret).unwrap_or_else(|_| secret.as_bytes().to_vec())
    } else {
        secret.as_bytes().to_vec()
    };

    let mut bytes = [0u8; SECRET_LEN];
    let len = raw.len().min(SECRET_LEN);
    bytes[..len].copy_from_slice(&raw[..len]);
    bytes
}
