//! Process-wide trust material for the local UI.
//!
//! # Design
//! - [`LocalTrust::mint`] runs once during startup, before any listener is
//!   bound; the result is shared behind an `Arc` and never mutated.
//! - The local token is handed to the browser once, in the launch URL.
//! - Session cookies are `base64url(claims) "." base64url(HMAC-SHA256(claims))`
//!   keyed by a random per-process key, so restarting the CLI invalidates
//!   every outstanding cookie.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::constants::{
    COOKIE_KEY_BYTES, LOCAL_TOKEN_BYTES, SESSION_CLOCK_SKEW_SECS, SESSION_COOKIE_ATTRIBUTES,
    SESSION_COOKIE_NAME, SESSION_MAX_AGE_DAYS,
};
use crate::error::{CookieError, TrustError, TrustResult};

type HmacSha256 = Hmac<Sha256>;

fn random_bytes<const N: usize>(purpose: &'static str) -> TrustResult<[u8; N]> {
    let mut bytes = [0_u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| TrustError::Entropy {
            purpose,
            detail: err.to_string(),
        })?;
    Ok(bytes)
}

/// One-time secret proving the browser was launched by this process.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalToken(String);

impl LocalToken {
    /// Fresh random token.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Entropy`] when the system random source fails.
    pub fn generate() -> TrustResult<Self> {
        let bytes = random_bytes::<LOCAL_TOKEN_BYTES>("local token")?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Byte-for-byte comparison against a presented value.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes() == presented.as_bytes()
    }

    /// The token itself, for building the launch URL.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LocalToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("LocalToken(<redacted>)")
    }
}

/// Claims carried inside a session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Seconds since the epoch when the cookie was issued.
    pub issued_at: i64,
}

/// Signs and verifies session cookies with a per-process key.
#[derive(Clone)]
pub struct SessionCookieCodec {
    mac: HmacSha256,
}

impl fmt::Debug for SessionCookieCodec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SessionCookieCodec(<redacted>)")
    }
}

impl SessionCookieCodec {
    /// Codec with a fresh random key.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Entropy`] when the system random source fails.
    pub fn generate() -> TrustResult<Self> {
        let key = random_bytes::<COOKIE_KEY_BYTES>("cookie signing key")?;
        let mac = HmacSha256::new_from_slice(&key).map_err(|err| TrustError::KeySetup {
            detail: err.to_string(),
        })?;
        Ok(Self { mac })
    }

    /// Signed cookie value issued at `now`.
    #[must_use]
    pub fn encode(&self, now: DateTime<Utc>) -> String {
        let claims = format!(r#"{{"issued_at":{}}}"#, now.timestamp());
        let payload = URL_SAFE_NO_PAD.encode(claims);
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    /// Verify `value` and return its claims when still valid at `now`.
    ///
    /// # Errors
    ///
    /// Returns the [`CookieError`] describing why the cookie was refused.
    pub fn decode(&self, value: &str, now: DateTime<Utc>) -> Result<SessionClaims, CookieError> {
        let (payload, signature) = value.split_once('.').ok_or(CookieError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CookieError::Encoding)?;
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CookieError::BadSignature)?;

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| CookieError::Encoding)?;
        let claims: SessionClaims =
            serde_json::from_slice(&raw).map_err(|_| CookieError::Claims)?;

        let age = now.timestamp() - claims.issued_at;
        if age > Duration::days(SESSION_MAX_AGE_DAYS).num_seconds() || age < -SESSION_CLOCK_SKEW_SECS
        {
            return Err(CookieError::Expired);
        }
        Ok(claims)
    }

    /// Full `Set-Cookie` value for a session issued at `now`.
    #[must_use]
    pub fn set_cookie(&self, now: DateTime<Utc>) -> String {
        format!(
            "{SESSION_COOKIE_NAME}={}; {SESSION_COOKIE_ATTRIBUTES}",
            self.encode(now)
        )
    }
}

/// The local token and cookie codec minted once per process.
#[derive(Debug, Clone)]
pub struct LocalTrust {
    token: LocalToken,
    cookies: SessionCookieCodec,
}

impl LocalTrust {
    /// Mint both secrets.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Entropy`] when the system random source fails.
    pub fn mint() -> TrustResult<Self> {
        Ok(Self {
            token: LocalToken::generate()?,
            cookies: SessionCookieCodec::generate()?,
        })
    }

    /// Local token handed to the browser.
    #[must_use]
    pub const fn token(&self) -> &LocalToken {
        &self.token
    }

    /// Session cookie codec.
    #[must_use]
    pub const fn cookies(&self) -> &SessionCookieCodec {
        &self.cookies
    }
}
