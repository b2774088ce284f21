//! Static API-key authentication.

use reqwest::Request;
use reqwest::header::{HeaderName, HeaderValue};

use crate::constants::HEADER_AUTHORIZATION;
use crate::error::{AuthError, AuthResult};

/// Sets `<header>: Key <api-key>` on every request.
///
/// The header value is built once at construction, so applying it never fails.
/// Empty keys are accepted here; rejecting them is the credential layer's job.
#[derive(Debug, Clone)]
pub struct ApiKeyAuthenticator {
    header: HeaderName,
    value: HeaderValue,
}

impl ApiKeyAuthenticator {
    /// Authenticator writing to the `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidHeader`] when the key holds characters that
    /// cannot appear in a header value.
    pub fn new(api_key: &str) -> AuthResult<Self> {
        Self::with_header(api_key, HEADER_AUTHORIZATION)
    }

    /// Authenticator writing to a custom header, for proxies that rewrite
    /// `Authorization`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidHeader`] when the header name or key is not
    /// valid in an HTTP header.
    pub fn with_header(api_key: &str, header: &str) -> AuthResult<Self> {
        let header =
            HeaderName::try_from(header).map_err(|_| AuthError::invalid_header(header))?;
        let value = key_header_value(api_key, header.as_str())?;
        Ok(Self { header, value })
    }

    /// Header this authenticator writes.
    #[must_use]
    pub const fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Replace any existing value of the configured header.
    pub fn apply(&self, request: &mut Request) {
        request
            .headers_mut()
            .insert(self.header.clone(), self.value.clone());
    }
}

/// `Key <api-key>` as a sensitive header value.
pub(crate) fn key_header_value(api_key: &str, header: &str) -> AuthResult<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Key {api_key}"))
        .map_err(|_| AuthError::invalid_header(header))?;
    value.set_sensitive(true);
    Ok(value)
}
