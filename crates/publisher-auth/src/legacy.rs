//! Legacy canonical-request signing.
//!
//! # Design
//! - The canonical string is `METHOD\nPATH\nDATE\nCHECKSUM`, where `PATH`
//!   excludes the query string and `DATE` is RFC 1123 in UTC.
//! - Secret credentials sign with HMAC-SHA256 over the canonical string and
//!   report a hex MD5 body checksum; RSA credentials sign the SHA-1 digest of
//!   the canonical string with PKCS#1 v1.5 and report a base64 MD5 checksum.
//! - Key material is decoded once at construction; a secret takes precedence
//!   when both a secret and a private key are supplied.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md5::{Digest as _, Md5};
use percent_encoding::percent_decode_str;
use reqwest::header::{DATE, HeaderName, HeaderValue};
use reqwest::{Method, Request};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::Sha1;
use sha2::Sha256;

use crate::constants::{
    HEADER_AUTH_SIGNATURE, HEADER_AUTH_TOKEN, HEADER_CONTENT_CHECKSUM, HMAC_SIGNATURE_VERSION,
    HTTP_DATE_FORMAT,
};
use crate::error::{AuthError, AuthResult};
use crate::keys::parse_private_key;

type HmacSha256 = Hmac<Sha256>;

enum SigningKey {
    Secret(Vec<u8>),
    Rsa(Box<RsaPrivateKey>),
}

/// Headers produced for one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `Date` header value.
    pub date: String,
    /// `X-Content-Checksum` header value.
    pub checksum: String,
    /// `X-Auth-Signature` header value.
    pub signature: String,
}

/// Signs each request with a token id and a shared secret or RSA key.
pub struct LegacyTokenAuthenticator {
    token_id: String,
    key: SigningKey,
}

impl fmt::Debug for LegacyTokenAuthenticator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SigningKey::Secret(_) => "secret",
            SigningKey::Rsa(_) => "rsa",
        };
        formatter
            .debug_struct("LegacyTokenAuthenticator")
            .field("token_id", &self.token_id)
            .field("key", &key)
            .finish()
    }
}

impl LegacyTokenAuthenticator {
    /// Build from a token id and a base64 secret or base64 PKCS#1 DER key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] for an empty token id,
    /// [`AuthError::MissingKeyOrSecret`] when neither key is supplied, and
    /// [`AuthError::SigningFailure`] when the supplied key cannot be decoded.
    pub fn new(
        token_id: &str,
        secret: Option<&str>,
        private_key: Option<&str>,
    ) -> AuthResult<Self> {
        if token_id.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let secret = secret.filter(|value| !value.is_empty());
        let private_key = private_key.filter(|value| !value.is_empty());
        let key = match (secret, private_key) {
            (Some(secret), _) => SigningKey::Secret(
                STANDARD
                    .decode(secret.trim())
                    .map_err(|err| AuthError::signing("decode token secret", err))?,
            ),
            (None, Some(private_key)) => SigningKey::Rsa(Box::new(parse_private_key(private_key)?)),
            (None, None) => return Err(AuthError::MissingKeyOrSecret),
        };
        Ok(Self {
            token_id: token_id.to_string(),
            key,
        })
    }

    /// Token id sent in `X-Auth-Token`.
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    /// Sign `request` using the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::apply_at`].
    pub fn apply(&self, request: &mut Request) -> AuthResult<()> {
        self.apply_at(request, Utc::now())
    }

    /// Sign `request` as if sent at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SigningFailure`] when the body is a stream that
    /// cannot be digested up front, when the path does not decode to UTF-8,
    /// or when signing fails.
    pub fn apply_at(&self, request: &mut Request, now: DateTime<Utc>) -> AuthResult<()> {
        let body = match request.body() {
            None => &[][..],
            Some(body) => body.as_bytes().ok_or_else(|| {
                AuthError::signing("read request body", "streaming bodies cannot be signed")
            })?,
        };
        let path = percent_decode_str(request.url().path())
            .decode_utf8()
            .map_err(|err| AuthError::signing("decode request path", err))?;
        let date = http_date(now);
        let signed = self.sign(request.method(), &path, &date, body)?;

        let headers = request.headers_mut();
        headers.insert(DATE, header_value(DATE.as_str(), &signed.date)?);
        headers.insert(
            HeaderName::from_static(HEADER_AUTH_TOKEN),
            header_value(HEADER_AUTH_TOKEN, &self.token_id)?,
        );
        let mut signature = header_value(HEADER_AUTH_SIGNATURE, &signed.signature)?;
        signature.set_sensitive(true);
        headers.insert(HeaderName::from_static(HEADER_AUTH_SIGNATURE), signature);
        headers.insert(
            HeaderName::from_static(HEADER_CONTENT_CHECKSUM),
            header_value(HEADER_CONTENT_CHECKSUM, &signed.checksum)?,
        );
        Ok(())
    }

    /// Compute checksum and signature for the given request parts.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SigningFailure`] when the cryptographic step fails.
    pub fn sign(
        &self,
        method: &Method,
        path: &str,
        date: &str,
        body: &[u8],
    ) -> AuthResult<SignedHeaders> {
        let body_digest = Md5::digest(body);
        let checksum = match self.key {
            SigningKey::Secret(_) => hex::encode(body_digest),
            SigningKey::Rsa(_) => STANDARD.encode(body_digest),
        };
        let canonical = canonical_request(method, path, date, &checksum);
        let signature = match &self.key {
            SigningKey::Secret(secret) => sign_hmac(secret, &canonical)?,
            SigningKey::Rsa(key) => sign_rsa(key, &canonical)?,
        };
        Ok(SignedHeaders {
            date: date.to_string(),
            checksum,
            signature,
        })
    }
}

/// The exact bytes that get signed.
#[must_use]
pub fn canonical_request(method: &Method, path: &str, date: &str, checksum: &str) -> String {
    format!("{}\n{path}\n{date}\n{checksum}", method.as_str())
}

/// RFC 1123 date in UTC, as used by the `Date` header.
#[must_use]
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format(HTTP_DATE_FORMAT).to_string()
}

fn sign_hmac(secret: &[u8], canonical: &str) -> AuthResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|err| AuthError::signing("initialise HMAC", err))?;
    mac.update(canonical.as_bytes());
    let tag = mac.finalize().into_bytes();
    Ok(format!("{}{HMAC_SIGNATURE_VERSION}", STANDARD.encode(tag)))
}

fn sign_rsa(key: &RsaPrivateKey, canonical: &str) -> AuthResult<String> {
    let digest = Sha1::digest(canonical.as_bytes());
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
        .map_err(|err| AuthError::signing("sign request", err))?;
    Ok(STANDARD.encode(signature))
}

fn header_value(header: &str, value: &str) -> AuthResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| AuthError::invalid_header(header))
}
