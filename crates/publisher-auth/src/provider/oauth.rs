use std::fmt;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{TokenProvider, identity_endpoint};
use crate::error::{AuthError, AuthResult};

const OAUTH_AUTHENTICATOR: &str = "OAUTH";
const SNOWFLAKE_ACCEPT: &str = "application/snowflake";

#[derive(Serialize)]
struct LoginRequest<'a> {
    data: LoginRequestData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginRequestData<'a> {
    account_name: &'a str,
    token: &'a str,
    authenticator: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    data: LoginResponseData,
}

#[derive(Default, Deserialize)]
struct LoginResponseData {
    #[serde(default)]
    token: String,
}

/// Login-request flow: trades a static OAuth token for a session token.
#[derive(Clone)]
pub struct OAuthTokenProvider {
    client: Client,
    account: String,
    token: String,
    login_endpoint: String,
}

impl fmt::Debug for OAuthTokenProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OAuthTokenProvider")
            .field("account", &self.account)
            .field("login_endpoint", &self.login_endpoint)
            .finish_non_exhaustive()
    }
}

impl OAuthTokenProvider {
    /// Provider logging in to `account` with `token`.
    #[must_use]
    pub fn new(client: Client, account: &str, token: &str) -> Self {
        Self {
            client,
            account: account.to_string(),
            token: token.to_string(),
            login_endpoint: identity_endpoint(account, "/session/v1/login-request"),
        }
    }

    /// Send login requests to `endpoint` instead of the account's identity host.
    #[must_use]
    pub fn with_login_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.login_endpoint = endpoint.into();
        self
    }

    /// Endpoint login requests are posted to.
    #[must_use]
    pub fn login_endpoint(&self) -> &str {
        &self.login_endpoint
    }

    fn exchange_error(&self, detail: &'static str) -> AuthError {
        AuthError::TokenExchange {
            endpoint: self.login_endpoint.clone(),
            detail,
        }
    }
}

#[async_trait]
impl TokenProvider for OAuthTokenProvider {
    async fn get_token(&self, host: &str) -> AuthResult<String> {
        debug!(endpoint = %self.login_endpoint, host, "requesting session token");
        let body = LoginRequest {
            data: LoginRequestData {
                account_name: &self.account,
                token: &self.token,
                authenticator: OAUTH_AUTHENTICATOR,
            },
        };
        let transport = |source| AuthError::Transport {
            url: self.login_endpoint.clone(),
            source,
        };
        let response = self
            .client
            .post(&self.login_endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, SNOWFLAKE_ACCEPT)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AuthError::TokenExchangeStatus {
                endpoint: self.login_endpoint.clone(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(transport)?;
        let parsed: LoginResponse = serde_json::from_slice(&bytes)
            .map_err(|_| self.exchange_error("error parsing login response body"))?;
        if parsed.data.token.is_empty() {
            return Err(self.exchange_error("missing token in login response"));
        }
        Ok(parsed.data.token)
    }
}
