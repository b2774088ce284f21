#![forbid(unsafe_code)]
#![deny(
    unused,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Outbound request authentication for the publishing client.
//!
//! A [`Credential`] selects one [`RequestAuthenticator`] variant at
//! construction time. Federated credentials resolve a named connection from
//! a [`publisher_config::ConnectionStore`] and exchange it for a bearer token
//! through a [`TokenProvider`] on every request.

pub mod api_key;
pub mod authenticator;
pub mod constants;
pub mod credential;
pub mod error;
pub mod federated;
pub mod keys;
pub mod legacy;
pub mod provider;
pub mod transport;

pub use api_key::ApiKeyAuthenticator;
pub use authenticator::RequestAuthenticator;
pub use credential::{AuthScheme, Credential};
pub use error::{AuthError, AuthResult};
pub use federated::FederatedAuthenticator;
pub use keys::{
    TokenClaimRequest, TokenClaimResponse, TokenCredentials, generate_token_credentials,
};
pub use legacy::{LegacyTokenAuthenticator, SignedHeaders, canonical_request};
pub use provider::{JwtTokenProvider, KeyPairClaims, OAuthTokenProvider, TokenProvider};
pub use transport::{AuthenticatedClient, ServerUser};
