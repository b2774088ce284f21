//! Federated identity connection model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One named identity-provider connection, as read from `connections.toml`
/// or the `[connections]` table of `config.toml`.
///
/// Unknown keys in the file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Identity-provider account identifier.
    #[serde(default)]
    pub account: String,
    /// Login name used for key-pair authentication.
    #[serde(default)]
    pub user: String,
    /// Path to a PKCS#8 PEM private key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_file: Option<String>,
    /// Alternate spelling of `private_key_file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,
    /// Static OAuth token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Authenticator kind (`oauth` or `snowflake_jwt`).
    #[serde(default)]
    pub authenticator: String,
    /// Role requested in the token scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Connection {
    /// Copy `private_key_path` into `private_key_file` when only the alias is set.
    pub fn apply_key_path_alias(&mut self) {
        let file_missing = self
            .private_key_file
            .as_deref()
            .is_none_or(str::is_empty);
        if file_missing
            && let Some(path) = self.private_key_path.as_deref()
            && !path.is_empty()
        {
            self.private_key_file = Some(path.to_string());
        }
    }

    /// Parse the declared authenticator kind.
    ///
    /// # Errors
    ///
    /// Returns the raw value when it names an unsupported kind.
    pub fn authenticator_kind(&self) -> Result<AuthenticatorKind, String> {
        self.authenticator.parse()
    }

    /// Copy of the connection with secret material masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            token: self.token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// How a connection proves its identity to the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorKind {
    /// Static OAuth token exchanged through the login-request flow.
    OAuth,
    /// Key-pair signed JWT exchanged at the OAuth token endpoint.
    KeyPairJwt,
}

impl AuthenticatorKind {
    /// Configuration spelling of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OAuth => "oauth",
            Self::KeyPairJwt => "snowflake_jwt",
        }
    }
}

impl FromStr for AuthenticatorKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "oauth" => Ok(Self::OAuth),
            "snowflake_jwt" => Ok(Self::KeyPairJwt),
            _ => Err(value.to_string()),
        }
    }
}

impl fmt::Display for AuthenticatorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_fills_missing_private_key_file() {
        let mut conn = Connection {
            private_key_path: Some("/keys/alias.p8".to_string()),
            ..Connection::default()
        };
        conn.apply_key_path_alias();
        assert_eq!(conn.private_key_file.as_deref(), Some("/keys/alias.p8"));
    }

    #[test]
    fn alias_never_replaces_explicit_private_key_file() {
        let mut conn = Connection {
            private_key_file: Some("/keys/primary.p8".to_string()),
            private_key_path: Some("/keys/alias.p8".to_string()),
            ..Connection::default()
        };
        conn.apply_key_path_alias();
        assert_eq!(conn.private_key_file.as_deref(), Some("/keys/primary.p8"));
    }

    #[test]
    fn alias_treats_empty_file_as_missing() {
        let mut conn = Connection {
            private_key_file: Some(String::new()),
            private_key_path: Some("/keys/alias.p8".to_string()),
            ..Connection::default()
        };
        conn.apply_key_path_alias();
        assert_eq!(conn.private_key_file.as_deref(), Some("/keys/alias.p8"));
    }

    #[test]
    fn authenticator_kind_is_case_insensitive() {
        assert_eq!("OAUTH".parse(), Ok(AuthenticatorKind::OAuth));
        assert_eq!("SNOWFLAKE_JWT".parse(), Ok(AuthenticatorKind::KeyPairJwt));
        assert_eq!(
            "externalbrowser".parse::<AuthenticatorKind>(),
            Err("externalbrowser".to_string())
        );
    }

    #[test]
    fn redacted_masks_token_only() {
        let conn = Connection {
            account: "acme".to_string(),
            token: Some("secret".to_string()),
            ..Connection::default()
        };
        let redacted = conn.redacted();
        assert_eq!(redacted.account, "acme");
        assert_eq!(redacted.token.as_deref(), Some("********"));
    }
}
