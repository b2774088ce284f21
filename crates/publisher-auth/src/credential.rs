//! Credential descriptors: how to prove identity to one remote server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Authentication scheme declared by a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// No authentication.
    None,
    /// `Authorization: Key <api-key>`.
    ApiKey,
    /// Canonical-request signing with a token id plus secret or RSA key.
    LegacyToken,
    /// Bearer token exchanged with a third-party identity provider.
    Federated,
}

impl AuthScheme {
    /// Tag spelling used in credential records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey => "api-key",
            Self::LegacyToken => "legacy-token",
            Self::Federated => "federated",
        }
    }
}

impl FromStr for AuthScheme {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "api-key" => Ok(Self::ApiKey),
            "legacy-token" => Ok(Self::LegacyToken),
            "federated" => Ok(Self::Federated),
            other => Err(AuthError::UnsupportedScheme {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Read-only description of one remote server and the material used to
/// authenticate against it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Server base URL.
    #[serde(default)]
    pub url: String,
    /// Scheme tag (`none`, `api-key`, `legacy-token`, `federated`).
    #[serde(default)]
    pub auth_type: String,
    /// API key (api-key scheme) or local key presented beside a federated token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Header name override for API keys, for proxies that rewrite `Authorization`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_header: Option<String>,
    /// Legacy token identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    /// Base64 shared secret for HMAC signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
    /// Base64 PKCS#1 DER RSA private key for RSA signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Federated identity connection name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
}

impl Credential {
    /// Parse the declared scheme tag.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsupportedScheme`] for unknown or empty tags.
    pub fn scheme(&self) -> Result<AuthScheme, AuthError> {
        self.auth_type.parse()
    }

    /// Best guess at the scheme from which fields are populated, used when a
    /// credential is assembled from command-line flags.
    #[must_use]
    pub fn infer_scheme(&self) -> AuthScheme {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        if present(&self.connection_name) {
            AuthScheme::Federated
        } else if present(&self.token_id) {
            AuthScheme::LegacyToken
        } else if present(&self.api_key) {
            AuthScheme::ApiKey
        } else {
            AuthScheme::None
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        formatter
            .debug_struct("Credential")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("auth_type", &self.auth_type)
            .field("api_key", &redact(&self.api_key))
            .field("api_key_header", &self.api_key_header)
            .field("token_id", &self.token_id)
            .field("token_secret", &redact(&self.token_secret))
            .field("private_key", &redact(&self.private_key))
            .field("connection_name", &self.connection_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_tags_round_trip_through_display() -> Result<(), AuthError> {
        for scheme in [
            AuthScheme::None,
            AuthScheme::ApiKey,
            AuthScheme::LegacyToken,
            AuthScheme::Federated,
        ] {
            assert_eq!(scheme.to_string().parse::<AuthScheme>()?, scheme);
        }
        Ok(())
    }

    #[test]
    fn unknown_or_empty_tags_are_unsupported() {
        for tag in ["", "oauth2", "API-KEY"] {
            assert!(matches!(
                tag.parse::<AuthScheme>(),
                Err(AuthError::UnsupportedScheme { ref value }) if value == tag
            ));
        }
    }

    #[test]
    fn infer_scheme_prefers_federated_then_token_then_key() {
        let mut credential = Credential {
            api_key: Some("k".to_string()),
            ..Credential::default()
        };
        assert_eq!(credential.infer_scheme(), AuthScheme::ApiKey);
        credential.token_id = Some("T1".to_string());
        assert_eq!(credential.infer_scheme(), AuthScheme::LegacyToken);
        credential.connection_name = Some("default".to_string());
        assert_eq!(credential.infer_scheme(), AuthScheme::Federated);
        assert_eq!(Credential::default().infer_scheme(), AuthScheme::None);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credential = Credential {
            api_key: Some("super-secret".to_string()),
            token_secret: Some("c2VjcmV0".to_string()),
            ..Credential::default()
        };
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn credential_deserializes_from_json_record() -> Result<(), serde_json::Error> {
        let credential: Credential = serde_json::from_str(
            r#"{"name":"prod","url":"https://connect.example.com","auth_type":"api-key","api_key":"abc"}"#,
        )?;
        assert_eq!(credential.api_key.as_deref(), Some("abc"));
        assert!(credential.token_id.is_none());
        Ok(())
    }
}
