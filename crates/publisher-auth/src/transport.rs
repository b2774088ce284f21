//! HTTP transport that authenticates every request before it leaves.

use reqwest::{Client, Request, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::authenticator::RequestAuthenticator;
use crate::error::{AuthError, AuthResult};

const SERVER_SETTINGS_PATH: &str = "__api__/server_settings";
const CURRENT_USER_PATH: &str = "__api__/v1/user";
const PUBLISHING_ROLES: [&str; 2] = ["publisher", "administrator"];

/// User record returned by the content server for the authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerUser {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Server role (`viewer`, `publisher`, `administrator`).
    #[serde(default)]
    pub user_role: String,
    /// Whether the account has been confirmed.
    #[serde(default)]
    pub confirmed: bool,
    /// Whether the account is locked.
    #[serde(default)]
    pub locked: bool,
}

/// A `reqwest` client paired with one authenticator.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: Client,
    authenticator: RequestAuthenticator,
}

impl AuthenticatedClient {
    /// Pair `client` with `authenticator`.
    #[must_use]
    pub const fn new(client: Client, authenticator: RequestAuthenticator) -> Self {
        Self {
            client,
            authenticator,
        }
    }

    /// Client that sends requests without credentials.
    #[must_use]
    pub fn unauthenticated(client: Client) -> Self {
        Self::new(client, RequestAuthenticator::Null)
    }

    /// Authenticator applied to each request.
    #[must_use]
    pub const fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    /// Authenticate and send `request`.
    ///
    /// # Errors
    ///
    /// Authentication failures abort before anything is sent; transport
    /// failures are returned as [`AuthError::Transport`].
    pub async fn execute(&self, mut request: Request) -> AuthResult<Response> {
        self.authenticator.add_auth_headers(&mut request).await?;
        let url = request.url().to_string();
        debug!(method = %request.method(), %url, scheme = %self.authenticator.scheme(), "sending request");
        self.client
            .execute(request)
            .await
            .map_err(|source| AuthError::Transport { url, source })
    }

    /// Authenticated GET of `url`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn get(&self, url: Url) -> AuthResult<Response> {
        let request = self
            .client
            .get(url.clone())
            .build()
            .map_err(|source| AuthError::Transport {
                url: url.to_string(),
                source,
            })?;
        self.execute(request).await
    }

    /// Check that `server` answers like a content server, without credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ServerCheck`] for a 404 or any other non-200 status.
    pub async fn test_connection(&self, server: &Url) -> AuthResult<()> {
        info!(url = %server, "testing connection");
        let anonymous = Self::unauthenticated(self.client.clone());
        let response = anonymous.get(api_url(server, SERVER_SETTINGS_PATH)?).await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(server_check(
                server,
                "the server does not appear to be a content server",
            )),
            status => Err(server_check(
                server,
                format!("unexpected response from server: {status}"),
            )),
        }
    }

    /// Fetch the authenticated user and confirm it may publish.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ServerCheck`] when the server rejects the
    /// credentials or the account is locked, unconfirmed, or lacks a
    /// publishing role.
    pub async fn test_authentication(&self, server: &Url) -> AuthResult<ServerUser> {
        info!(url = %server, scheme = %self.authenticator.scheme(), "testing authentication");
        let response = self.get(api_url(server, CURRENT_USER_PATH)?).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(server_check(
                server,
                format!("authentication rejected: {status}"),
            ));
        }
        let user: ServerUser = response
            .json()
            .await
            .map_err(|err| server_check(server, format!("unreadable user record: {err}")))?;
        check_publisher(&user).map_err(|detail| server_check(server, detail))?;
        Ok(user)
    }
}

/// `server` with `path` appended below its existing path.
///
/// # Errors
///
/// Returns [`AuthError::ServerCheck`] when the joined URL is invalid.
pub fn api_url(server: &Url, path: &str) -> AuthResult<Url> {
    let joined = format!("{}/{path}", server.as_str().trim_end_matches('/'));
    Url::parse(&joined).map_err(|err| server_check(server, err.to_string()))
}

fn check_publisher(user: &ServerUser) -> Result<(), String> {
    if user.locked {
        return Err(format!("user account {} is locked", user.username));
    }
    if !user.confirmed {
        return Err(format!("user account {} is not confirmed", user.username));
    }
    if !PUBLISHING_ROLES.contains(&user.user_role.as_str()) {
        return Err(format!(
            "user account {} with role '{}' does not have permission to publish content",
            user.username, user.user_role
        ));
    }
    Ok(())
}

fn server_check(server: &Url, detail: impl Into<String>) -> AuthError {
    AuthError::ServerCheck {
        url: server.to_string(),
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_key::ApiKeyAuthenticator;
    use crate::federated::FederatedAuthenticator;
    use crate::provider::TokenProvider;
    use anyhow::Result;
    use httpmock::prelude::*;
    use reqwest::Method;
    use std::sync::Arc;

    struct RefusingProvider;

    #[async_trait::async_trait]
    impl TokenProvider for RefusingProvider {
        async fn get_token(&self, _host: &str) -> AuthResult<String> {
            Err(AuthError::TokenExchangeStatus {
                endpoint: "https://acme.snowflakecomputing.com/oauth/token".to_string(),
                status: 403,
            })
        }
    }

    fn server_url(server: &MockServer) -> Result<Url> {
        Ok(Url::parse(&server.url("/rsc/"))?)
    }

    #[test]
    fn api_url_appends_below_existing_path() -> Result<()> {
        let base = Url::parse("https://connect.example.com/rsc/")?;
        assert_eq!(
            api_url(&base, "__api__/v1/user")?.as_str(),
            "https://connect.example.com/rsc/__api__/v1/user"
        );
        let bare = Url::parse("https://connect.example.com")?;
        assert_eq!(
            api_url(&bare, "__api__/server_settings")?.as_str(),
            "https://connect.example.com/__api__/server_settings"
        );
        Ok(())
    }

    #[test]
    fn publisher_check_applies_account_rules() {
        let ok = ServerUser {
            username: "ana".to_string(),
            user_role: "publisher".to_string(),
            confirmed: true,
            ..ServerUser::default()
        };
        assert!(check_publisher(&ok).is_ok());
        assert!(check_publisher(&ServerUser { locked: true, ..ok.clone() }).is_err());
        assert!(check_publisher(&ServerUser { confirmed: false, ..ok.clone() }).is_err());
        assert_eq!(
            check_publisher(&ServerUser {
                user_role: "viewer".to_string(),
                ..ok
            }),
            Err("user account ana with role 'viewer' does not have permission to publish content"
                .to_string())
        );
    }

    #[tokio::test]
    async fn execute_applies_authenticator() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rsc/__api__/v1/user")
                    .header("authorization", "Key abc");
                then.status(200).body(
                    r#"{"username":"ana","user_role":"publisher","confirmed":true,"locked":false}"#,
                );
            })
            .await;

        let client = AuthenticatedClient::new(
            Client::new(),
            RequestAuthenticator::ApiKey(ApiKeyAuthenticator::new("abc")?),
        );
        let user = client.test_authentication(&server_url(&server)?).await?;
        assert_eq!(user.username, "ana");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn authenticator_failure_sends_nothing() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path("/anything");
                then.status(200);
            })
            .await;

        let client = AuthenticatedClient::new(
            Client::new(),
            RequestAuthenticator::Federated(FederatedAuthenticator::new(
                Arc::new(RefusingProvider),
                None,
            )?),
        );
        let request = Request::new(Method::GET, Url::parse(&server.url("/anything"))?);
        let result = client.execute(request).await;

        assert!(matches!(
            result,
            Err(AuthError::TokenExchangeStatus { status: 403, .. })
        ));
        mock.assert_hits_async(0).await;
        Ok(())
    }

    #[tokio::test]
    async fn test_connection_sends_no_credentials() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/rsc/__api__/server_settings");
                then.status(200).body("{}");
            })
            .await;

        let client = AuthenticatedClient::new(
            Client::new(),
            RequestAuthenticator::ApiKey(ApiKeyAuthenticator::new("abc")?),
        );
        client.test_connection(&server_url(&server)?).await?;
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_connection_reports_non_content_server() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rsc/__api__/server_settings");
                then.status(404);
            })
            .await;

        let client = AuthenticatedClient::unauthenticated(Client::new());
        let result = client.test_connection(&server_url(&server)?).await;
        assert!(matches!(
            result,
            Err(AuthError::ServerCheck { ref detail, .. }) if detail.contains("content server")
        ));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_credentials_are_reported() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rsc/__api__/v1/user");
                then.status(401);
            })
            .await;

        let client = AuthenticatedClient::unauthenticated(Client::new());
        let result = client.test_authentication(&server_url(&server)?).await;
        assert!(matches!(
            result,
            Err(AuthError::ServerCheck { ref detail, .. }) if detail.starts_with("authentication rejected")
        ));
        Ok(())
    }
}
