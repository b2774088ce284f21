//! Short-lived bearer tokens for federated identity.
//!
//! Providers are immutable after construction and exchange on every call;
//! nothing is cached between requests.

mod jwt;
mod oauth;

use async_trait::async_trait;

use crate::constants::IDENTITY_HOST_SUFFIX;
use crate::error::AuthResult;

pub use jwt::{JwtTokenProvider, KeyPairClaims};
pub use oauth::OAuthTokenProvider;

/// Produces a bearer token valid for a target host.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Exchange the provider's long-lived credential for a token scoped to `host`.
    async fn get_token(&self, host: &str) -> AuthResult<String>;
}

pub(crate) fn identity_endpoint(account: &str, path: &str) -> String {
    format!("https://{account}.{IDENTITY_HOST_SUFFIX}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_endpoint_is_derived_from_account() {
        assert_eq!(
            identity_endpoint("acme-prod", "/oauth/token"),
            "https://acme-prod.snowflakecomputing.com/oauth/token"
        );
    }
}
