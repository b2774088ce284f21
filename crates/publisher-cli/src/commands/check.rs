use publisher_auth::{AuthenticatedClient, RequestAuthenticator};
use publisher_config::ConnectionStore;
use reqwest::Client;
use tracing::info;

use crate::cli::{CheckArgs, OutputFormat};
use crate::client::CliResult;
use crate::output::render_user;

/// Verify a server is reachable and that the supplied credential may publish.
///
/// Credential problems are reported before any request leaves the process.
pub(crate) async fn handle_check(
    client: &Client,
    store: &ConnectionStore,
    args: &CheckArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let credential = args.credential();
    let authenticator = RequestAuthenticator::from_credential(&credential, client, store)?;
    info!(scheme = %authenticator.scheme(), url = %args.url, "checking credential");

    let client = AuthenticatedClient::new(client.clone(), authenticator);
    client.test_connection(&args.url).await?;
    let user = client.test_authentication(&args.url).await?;
    render_user(&user, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use publisher_config::{EnvSnapshot, MemoryFs};
    use reqwest::Url;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn empty_store() -> ConnectionStore {
        ConnectionStore::new(
            Arc::new(MemoryFs::new()),
            vec![PathBuf::from("/nowhere")],
            EnvSnapshot::default(),
        )
    }

    fn args(url: Url) -> CheckArgs {
        CheckArgs {
            url,
            auth_type: None,
            api_key: None,
            api_key_header: None,
            token_id: None,
            token_secret: None,
            private_key: None,
            connection_name: None,
        }
    }

    #[tokio::test]
    async fn api_key_check_reports_user() -> Result<()> {
        let server = MockServer::start_async().await;
        let settings = server
            .mock_async(|when, then| {
                when.method(GET).path("/__api__/server_settings");
                then.status(200).json_body(json!({}));
            })
            .await;
        let user = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/__api__/v1/user")
                    .header("authorization", "Key abc123");
                then.status(200).json_body(json!({
                    "username": "alice",
                    "email": "alice@example.com",
                    "user_role": "publisher",
                    "confirmed": true,
                    "locked": false
                }));
            })
            .await;

        let mut check = args(Url::parse(&server.base_url())?);
        check.api_key = Some("abc123".to_string());
        let result = handle_check(&Client::new(), &empty_store(), &check, OutputFormat::Json).await;

        assert!(result.is_ok());
        settings.assert_async().await;
        user.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn viewer_role_fails_the_check() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/__api__/server_settings");
                then.status(200).json_body(json!({}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/__api__/v1/user");
                then.status(200).json_body(json!({
                    "username": "bob",
                    "user_role": "viewer",
                    "confirmed": true
                }));
            })
            .await;

        let mut check = args(Url::parse(&server.base_url())?);
        check.api_key = Some("abc123".to_string());
        let result = handle_check(&Client::new(), &empty_store(), &check, OutputFormat::Table).await;

        assert!(matches!(result, Err(err) if err.exit_code() == 3));
        Ok(())
    }

    #[tokio::test]
    async fn bad_credential_fails_before_any_request() -> Result<()> {
        let server = MockServer::start_async().await;
        let settings = server
            .mock_async(|when, then| {
                when.method(GET).path("/__api__/server_settings");
                then.status(200);
            })
            .await;

        let mut check = args(Url::parse(&server.base_url())?);
        check.auth_type = Some("kerberos".to_string());
        let result = handle_check(&Client::new(), &empty_store(), &check, OutputFormat::Table).await;

        assert!(matches!(
            result,
            Err(err) if err.exit_code() == 2
                && err.display_message() == "unsupported authentication scheme 'kerberos'"
        ));
        settings.assert_hits_async(0).await;
        Ok(())
    }

    #[tokio::test]
    async fn unknown_connection_is_a_validation_error() -> Result<()> {
        let mut check = args(Url::parse("http://127.0.0.1:9")?);
        check.connection_name = Some("prod".to_string());
        let result = handle_check(&Client::new(), &empty_store(), &check, OutputFormat::Table).await;

        assert!(matches!(result, Err(err) if err.exit_code() != 0));
        Ok(())
    }
}
