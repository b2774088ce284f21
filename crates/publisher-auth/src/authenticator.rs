//! Scheme dispatch for outbound requests.

use std::sync::Arc;

use publisher_config::ConnectionStore;
use reqwest::{Client, Request};

use crate::api_key::ApiKeyAuthenticator;
use crate::credential::{AuthScheme, Credential};
use crate::error::{AuthError, AuthResult};
use crate::federated::FederatedAuthenticator;
use crate::legacy::LegacyTokenAuthenticator;

/// Attaches proof of identity to outbound requests.
///
/// The variant is chosen once from the credential's scheme tag; every
/// variant holds only immutable material and can be shared across tasks.
#[derive(Debug, Clone, Default)]
pub enum RequestAuthenticator {
    /// Leaves requests untouched.
    #[default]
    Null,
    /// Static API key header.
    ApiKey(ApiKeyAuthenticator),
    /// Canonical-request signature.
    LegacyToken(Arc<LegacyTokenAuthenticator>),
    /// Federated bearer token, optionally with a local API key.
    Federated(FederatedAuthenticator),
}

impl RequestAuthenticator {
    /// Build the authenticator declared by `credential`.
    ///
    /// # Errors
    ///
    /// Unknown scheme tags fail with [`AuthError::UnsupportedScheme`]; missing
    /// or malformed scheme material fails with the matching construction error.
    pub fn from_credential(
        credential: &Credential,
        client: &Client,
        store: &ConnectionStore,
    ) -> AuthResult<Self> {
        match credential.scheme()? {
            AuthScheme::None => Ok(Self::Null),
            AuthScheme::ApiKey => {
                let key = credential
                    .api_key
                    .as_deref()
                    .ok_or(AuthError::MissingCredential {
                        scheme: AuthScheme::ApiKey.as_str(),
                        field: "an API key",
                    })?;
                let authenticator = match credential
                    .api_key_header
                    .as_deref()
                    .filter(|header| !header.is_empty())
                {
                    Some(header) => ApiKeyAuthenticator::with_header(key, header)?,
                    None => ApiKeyAuthenticator::new(key)?,
                };
                Ok(Self::ApiKey(authenticator))
            }
            AuthScheme::LegacyToken => Ok(Self::LegacyToken(Arc::new(
                LegacyTokenAuthenticator::new(
                    credential.token_id.as_deref().unwrap_or_default(),
                    credential.token_secret.as_deref(),
                    credential.private_key.as_deref(),
                )?,
            ))),
            AuthScheme::Federated => Ok(Self::Federated(FederatedAuthenticator::from_connection(
                client,
                store,
                credential.connection_name.as_deref().unwrap_or_default(),
                credential.api_key.as_deref(),
            )?)),
        }
    }

    /// Scheme this authenticator implements.
    #[must_use]
    pub const fn scheme(&self) -> AuthScheme {
        match self {
            Self::Null => AuthScheme::None,
            Self::ApiKey(_) => AuthScheme::ApiKey,
            Self::LegacyToken(_) => AuthScheme::LegacyToken,
            Self::Federated(_) => AuthScheme::Federated,
        }
    }

    /// Add this scheme's headers to `request`.
    ///
    /// # Errors
    ///
    /// Signing and token exchange failures are returned; the request must not
    /// be sent in that case.
    pub async fn add_auth_headers(&self, request: &mut Request) -> AuthResult<()> {
        match self {
            Self::Null => Ok(()),
            Self::ApiKey(authenticator) => {
                authenticator.apply(request);
                Ok(())
            }
            Self::LegacyToken(authenticator) => authenticator.apply(request),
            Self::Federated(authenticator) => authenticator.apply(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use publisher_config::{ConfigError, EnvSnapshot, MemoryFs};
    use publisher_test_support::keys::RSA_PKCS1_DER_BASE64;
    use reqwest::Method;
    use std::path::PathBuf;

    fn empty_store() -> ConnectionStore {
        ConnectionStore::new(
            Arc::new(MemoryFs::new()),
            vec![PathBuf::from("/nowhere")],
            EnvSnapshot::default(),
        )
    }

    fn credential(auth_type: &str) -> Credential {
        Credential {
            name: "prod".to_string(),
            url: "https://connect.example.com".to_string(),
            auth_type: auth_type.to_string(),
            ..Credential::default()
        }
    }

    fn build(credential: &Credential) -> AuthResult<RequestAuthenticator> {
        RequestAuthenticator::from_credential(credential, &Client::new(), &empty_store())
    }

    fn request() -> Result<Request> {
        Ok(Request::new(
            Method::GET,
            "https://connect.example.com/__api__/v1/user".parse()?,
        ))
    }

    #[tokio::test]
    async fn null_authenticator_leaves_headers_untouched() -> Result<()> {
        let auth = build(&credential("none"))?;
        let mut request = request()?;
        auth.add_auth_headers(&mut request).await?;
        assert!(request.headers().is_empty());
        assert_eq!(auth.scheme(), AuthScheme::None);
        Ok(())
    }

    #[tokio::test]
    async fn api_key_sets_authorization() -> Result<()> {
        let auth = build(&Credential {
            api_key: Some("abc123".to_string()),
            ..credential("api-key")
        })?;
        let mut request = request()?;
        auth.add_auth_headers(&mut request).await?;
        assert_eq!(request.headers()["authorization"], "Key abc123");
        Ok(())
    }

    #[tokio::test]
    async fn api_key_header_override_is_honoured() -> Result<()> {
        let auth = build(&Credential {
            api_key: Some("abc123".to_string()),
            api_key_header: Some("X-Proxy-Key".to_string()),
            ..credential("api-key")
        })?;
        let mut request = request()?;
        auth.add_auth_headers(&mut request).await?;
        assert_eq!(request.headers()["x-proxy-key"], "Key abc123");
        assert!(!request.headers().contains_key("authorization"));
        Ok(())
    }

    #[test]
    fn api_key_scheme_without_key_is_rejected() {
        assert!(matches!(
            build(&credential("api-key")),
            Err(AuthError::MissingCredential {
                scheme: "api-key",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn legacy_token_signs_requests() -> Result<()> {
        let auth = build(&Credential {
            token_id: Some("T0001".to_string()),
            private_key: Some(RSA_PKCS1_DER_BASE64.to_string()),
            ..credential("legacy-token")
        })?;
        let mut request = request()?;
        auth.add_auth_headers(&mut request).await?;
        for header in ["date", "x-auth-token", "x-auth-signature", "x-content-checksum"] {
            assert!(request.headers().contains_key(header), "missing {header}");
        }
        Ok(())
    }

    #[test]
    fn legacy_token_errors_are_specific() {
        assert!(matches!(
            build(&Credential {
                token_secret: Some("c2VjcmV0".to_string()),
                ..credential("legacy-token")
            }),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            build(&Credential {
                token_id: Some("T0001".to_string()),
                ..credential("legacy-token")
            }),
            Err(AuthError::MissingKeyOrSecret)
        ));
    }

    #[test]
    fn unknown_or_empty_scheme_is_a_construction_error() {
        for tag in ["kerberos", ""] {
            assert!(matches!(
                build(&credential(tag)),
                Err(AuthError::UnsupportedScheme { .. })
            ));
        }
    }

    #[test]
    fn federated_without_configuration_reports_it() {
        let result = build(&Credential {
            connection_name: Some("prod".to_string()),
            ..credential("federated")
        });
        assert!(matches!(
            result,
            Err(AuthError::Connection(
                ConfigError::ConfigurationUnavailable
            ))
        ));
    }
}
