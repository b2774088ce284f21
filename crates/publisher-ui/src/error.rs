//! Error types for the local trust broker and UI server.

use std::io;

use thiserror::Error;

/// Failures while minting local trust material or hosting the UI server.
#[derive(Debug, Error)]
pub enum TrustError {
    /// The operating system random source failed.
    #[error("failed to read {purpose} from the system random source: {detail}")]
    Entropy {
        /// What the random bytes were for.
        purpose: &'static str,
        /// Failure detail.
        detail: String,
    },
    /// The cookie signing key was rejected by the MAC.
    #[error("failed to initialise cookie signing: {detail}")]
    KeySetup {
        /// Failure detail.
        detail: String,
    },
    /// The UI server could not bind its listener.
    #[error("failed to bind UI server to {address}")]
    Bind {
        /// Requested address.
        address: String,
        /// Source IO error.
        source: io::Error,
    },
    /// The UI server stopped with an IO error.
    #[error("UI server error")]
    Serve {
        /// Source IO error.
        #[source]
        source: io::Error,
    },
    /// The configured host, port and path do not form a valid URL.
    #[error("invalid UI server URL: {detail}")]
    InvalidUrl {
        /// Parser detail.
        detail: String,
    },
}

/// Convenience alias for trust broker results.
pub type TrustResult<T> = Result<T, TrustError>;

/// Reasons a presented session cookie is not accepted.
///
/// These are logged and otherwise treated as "no session"; they never reach
/// the browser.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CookieError {
    /// The value is not `<claims>.<signature>`.
    #[error("session cookie is malformed")]
    Malformed,
    /// A segment is not valid base64url.
    #[error("session cookie is not valid base64url")]
    Encoding,
    /// The signature does not match the claims.
    #[error("session cookie signature mismatch")]
    BadSignature,
    /// The signed claims could not be decoded.
    #[error("session cookie claims are unreadable")]
    Claims,
    /// The cookie is older than the session lifetime or stamped in the future.
    #[error("session cookie has expired")]
    Expired,
}
