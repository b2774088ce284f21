use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use tracing::debug;

use super::{TokenProvider, identity_endpoint};
use crate::constants::{JWT_BEARER_GRANT, JWT_LIFETIME_SECS};
use crate::error::{AuthError, AuthResult};

/// Claims presented to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairClaims {
    /// `<ACCOUNT>.<USER>`, uppercased.
    pub sub: String,
    /// `<sub>.SHA256:<public key fingerprint>`.
    pub iss: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

#[derive(Serialize)]
struct TokenForm<'a> {
    grant_type: &'a str,
    scope: &'a str,
    assertion: &'a str,
}

/// Key-pair authentication: signs a JWT and exchanges it for an access token.
pub struct JwtTokenProvider {
    client: Client,
    subject: String,
    fingerprint: String,
    encoding_key: EncodingKey,
    role: Option<String>,
    token_endpoint: String,
}

impl fmt::Debug for JwtTokenProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JwtTokenProvider")
            .field("subject", &self.subject)
            .field("fingerprint", &self.fingerprint)
            .field("role", &self.role)
            .field("token_endpoint", &self.token_endpoint)
            .finish_non_exhaustive()
    }
}

impl JwtTokenProvider {
    /// Load the PKCS#8 PEM key at `private_key_file` and prepare the provider.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::PrivateKeyRead`] when the file cannot be read and
    /// [`AuthError::PrivateKey`] when it does not hold an RSA PKCS#8 key.
    pub fn new(
        client: Client,
        account: &str,
        user: &str,
        private_key_file: &Path,
        role: Option<&str>,
    ) -> AuthResult<Self> {
        let pem = fs::read_to_string(private_key_file).map_err(|source| {
            AuthError::PrivateKeyRead {
                path: private_key_file.to_path_buf(),
                source,
            }
        })?;
        let key_error = |detail: String| AuthError::PrivateKey {
            path: PathBuf::from(private_key_file),
            detail,
        };
        let private_key =
            RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|err| key_error(err.to_string()))?;
        let public_der = private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(|err| key_error(err.to_string()))?;
        let private_der = private_key
            .to_pkcs1_der()
            .map_err(|err| key_error(err.to_string()))?;

        Ok(Self {
            client,
            subject: format!("{account}.{user}").to_uppercase(),
            fingerprint: STANDARD.encode(Sha256::digest(public_der.as_bytes())),
            encoding_key: EncodingKey::from_rsa_der(private_der.as_bytes()),
            role: role.filter(|role| !role.is_empty()).map(str::to_string),
            token_endpoint: identity_endpoint(account, "/oauth/token"),
        })
    }

    /// Send token requests to `endpoint` instead of the account's identity host.
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Endpoint the signed JWT is exchanged at.
    #[must_use]
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// Requested scope for `host`, prefixed with the session role when set.
    #[must_use]
    pub fn scope(&self, host: &str) -> String {
        match &self.role {
            Some(role) => format!("session:role:{role} {host}"),
            None => host.to_string(),
        }
    }

    /// Claims for a JWT issued at `now`.
    #[must_use]
    pub fn claims(&self, now: DateTime<Utc>) -> KeyPairClaims {
        let iat = now.timestamp();
        KeyPairClaims {
            sub: self.subject.clone(),
            iss: format!("{}.SHA256:{}", self.subject, self.fingerprint),
            iat,
            exp: iat + JWT_LIFETIME_SECS,
        }
    }

    /// RS256-signed JWT issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SigningFailure`] when signing fails.
    pub fn signed_jwt(&self, now: DateTime<Utc>) -> AuthResult<String> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &self.claims(now),
            &self.encoding_key,
        )
        .map_err(|err| AuthError::signing("sign JWT", err))
    }
}

#[async_trait]
impl TokenProvider for JwtTokenProvider {
    async fn get_token(&self, host: &str) -> AuthResult<String> {
        let assertion = self.signed_jwt(Utc::now())?;
        let scope = self.scope(host);
        debug!(endpoint = %self.token_endpoint, scope = %scope, "exchanging key-pair JWT");

        let transport = |source| AuthError::Transport {
            url: self.token_endpoint.clone(),
            source,
        };
        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&TokenForm {
                grant_type: JWT_BEARER_GRANT,
                scope: &scope,
                assertion: &assertion,
            })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AuthError::TokenExchangeStatus {
                endpoint: self.token_endpoint.clone(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(transport)
    }
}
