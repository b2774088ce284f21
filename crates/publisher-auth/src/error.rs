//! Error types for outbound authentication.

use std::io;
use std::path::PathBuf;

use publisher_config::ConfigError;
use thiserror::Error;

/// Failures while constructing an authenticator or proving identity for a request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential declared a scheme this client does not implement.
    #[error("unsupported authentication scheme '{value}'")]
    UnsupportedScheme {
        /// Scheme tag as declared.
        value: String,
    },
    /// A federated connection declared an unsupported authenticator kind.
    #[error("connection {connection} uses unsupported authenticator '{value}'")]
    UnsupportedAuthenticator {
        /// Connection name.
        connection: String,
        /// Authenticator kind as declared.
        value: String,
    },
    /// A scheme-specific field required to build proof is absent.
    #[error("{scheme} authentication requires {field}")]
    MissingCredential {
        /// Scheme being constructed.
        scheme: &'static str,
        /// Missing field.
        field: &'static str,
    },
    /// Legacy token signing needs a token id.
    #[error("token id is required for token authentication")]
    MissingToken,
    /// Legacy token signing needs either a shared secret or a private key.
    #[error("token authentication requires a secret or a private key")]
    MissingKeyOrSecret,
    /// An encoding or cryptographic operation failed.
    #[error("failed to {operation}: {detail}")]
    SigningFailure {
        /// Operation that failed.
        operation: &'static str,
        /// Failure detail.
        detail: String,
    },
    /// A private key file could not be read.
    #[error("error loading private key file {}", path.display())]
    PrivateKeyRead {
        /// Key file path.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// A private key file did not hold a PKCS#8 PEM RSA key.
    #[error("invalid private key in {}: {detail}", path.display())]
    PrivateKey {
        /// Key file path.
        path: PathBuf,
        /// Decoding failure detail.
        detail: String,
    },
    /// A computed value could not be carried in an HTTP header.
    #[error("invalid value for header {header}")]
    InvalidHeader {
        /// Header name.
        header: String,
    },
    /// The token endpoint answered with a non-200 status.
    #[error("error status from token exchange with {endpoint}: {status}")]
    TokenExchangeStatus {
        /// Endpoint that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
    },
    /// The token endpoint answered with an unusable body.
    #[error("token exchange with {endpoint} failed: {detail}")]
    TokenExchange {
        /// Endpoint that was called.
        endpoint: String,
        /// Failure detail.
        detail: &'static str,
    },
    /// The HTTP transport failed.
    #[error("request to {url} failed")]
    Transport {
        /// Target URL.
        url: String,
        /// Source transport error.
        source: reqwest::Error,
    },
    /// A connectivity check against a content server failed.
    #[error("server check against {url} failed: {detail}")]
    ServerCheck {
        /// Server URL.
        url: String,
        /// Human readable reason.
        detail: String,
    },
    /// Connection configuration could not be resolved.
    #[error(transparent)]
    Connection(#[from] ConfigError),
}

/// Convenience alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub(crate) fn signing(operation: &'static str, detail: impl ToString) -> Self {
        Self::SigningFailure {
            operation,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn invalid_header(header: impl Into<String>) -> Self {
        Self::InvalidHeader {
            header: header.into(),
        }
    }
}
