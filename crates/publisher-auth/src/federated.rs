//! Federated token-exchange authentication.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use publisher_config::{AuthenticatorKind, Connection, ConnectionStore};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Request};
use tracing::debug;
use url::Host;

use crate::api_key::key_header_value;
use crate::constants::{HEADER_AUTHORIZATION, HEADER_RSC_AUTHORIZATION};
use crate::error::{AuthError, AuthResult};
use crate::provider::{JwtTokenProvider, OAuthTokenProvider, TokenProvider};

const SCHEME: &str = "federated";

/// Exchanges a federated identity for a bearer token on every request.
///
/// When a local API key is configured it is sent alongside the token so the
/// request also satisfies a gateway's own key check.
#[derive(Clone)]
pub struct FederatedAuthenticator {
    provider: Arc<dyn TokenProvider>,
    local_api_key: Option<HeaderValue>,
}

impl fmt::Debug for FederatedAuthenticator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FederatedAuthenticator")
            .field("local_api_key", &self.local_api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl FederatedAuthenticator {
    /// Wrap `provider`, optionally presenting `local_api_key` as well.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidHeader`] when the key cannot be carried in a header.
    pub fn new(provider: Arc<dyn TokenProvider>, local_api_key: Option<&str>) -> AuthResult<Self> {
        let local_api_key = local_api_key
            .filter(|key| !key.is_empty())
            .map(|key| key_header_value(key, HEADER_RSC_AUTHORIZATION))
            .transpose()?;
        Ok(Self {
            provider,
            local_api_key,
        })
    }

    /// Resolve connection `name` from `store` and build the matching provider.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::MissingCredential`] for an empty name or an
    /// incomplete connection, [`AuthError::Connection`] when the connection
    /// cannot be resolved, and [`AuthError::UnsupportedAuthenticator`] for an
    /// unknown authenticator kind. Key loading errors are surfaced as-is.
    pub fn from_connection(
        client: &Client,
        store: &ConnectionStore,
        name: &str,
        local_api_key: Option<&str>,
    ) -> AuthResult<Self> {
        if name.is_empty() {
            return Err(missing("a connection name"));
        }
        let connection = store.get(name)?;
        let provider = provider_for(client, name, &connection)?;
        debug!(connection = name, authenticator = %connection.authenticator, "federated provider ready");
        Self::new(provider, local_api_key)
    }

    /// Set `Authorization: Snowflake Token="…"` and, when configured, the
    /// secondary API-key header.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredential`] when the request URL has no
    /// host to scope the token to. Token exchange errors are returned
    /// unchanged.
    pub async fn apply(&self, request: &mut Request) -> AuthResult<()> {
        let host = match request.url().host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(address)) => address.to_string(),
            Some(Host::Ipv6(address)) => address.to_string(),
            _ => return Err(missing("a request host")),
        };
        let token = self.provider.get_token(&host).await?;

        let mut bearer = HeaderValue::from_str(&format!("Snowflake Token=\"{token}\""))
            .map_err(|_| AuthError::invalid_header(HEADER_AUTHORIZATION))?;
        bearer.set_sensitive(true);
        let headers = request.headers_mut();
        headers.insert(HeaderName::from_static(HEADER_AUTHORIZATION), bearer);
        if let Some(key) = &self.local_api_key {
            headers.insert(HeaderName::from_static(HEADER_RSC_AUTHORIZATION), key.clone());
        }
        Ok(())
    }
}

fn provider_for(
    client: &Client,
    name: &str,
    connection: &Connection,
) -> AuthResult<Arc<dyn TokenProvider>> {
    let kind = connection
        .authenticator_kind()
        .map_err(|value| AuthError::UnsupportedAuthenticator {
            connection: name.to_string(),
            value,
        })?;
    match kind {
        AuthenticatorKind::OAuth => {
            let token = required(connection.token.as_deref(), "a token")?;
            Ok(Arc::new(OAuthTokenProvider::new(
                client.clone(),
                &connection.account,
                token,
            )))
        }
        AuthenticatorKind::KeyPairJwt => {
            let account = required(Some(&connection.account), "an account")?;
            let user = required(Some(&connection.user), "a user")?;
            let key_file = required(connection.private_key_file.as_deref(), "a private key file")?;
            Ok(Arc::new(JwtTokenProvider::new(
                client.clone(),
                account,
                user,
                Path::new(key_file),
                connection.role.as_deref(),
            )?))
        }
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> AuthResult<&'a str> {
    value.filter(|value| !value.is_empty()).ok_or_else(|| missing(field))
}

const fn missing(field: &'static str) -> AuthError {
    AuthError::MissingCredential {
        scheme: SCHEME,
        field,
    }
}
