//! Header names and fixed values used by outbound authenticators.

/// Default header carrying API keys and federated bearer tokens.
pub const HEADER_AUTHORIZATION: &str = "authorization";
/// Secondary API-key header sent alongside a federated token.
pub const HEADER_RSC_AUTHORIZATION: &str = "x-rsc-authorization";
/// Legacy token identifier.
pub const HEADER_AUTH_TOKEN: &str = "x-auth-token";
/// Legacy request signature.
pub const HEADER_AUTH_SIGNATURE: &str = "x-auth-signature";
/// Legacy body digest.
pub const HEADER_CONTENT_CHECKSUM: &str = "x-content-checksum";

/// Suffix appended to HMAC legacy signatures.
pub(crate) const HMAC_SIGNATURE_VERSION: &str = "; version=1";
/// RFC 1123 date format used by the legacy canonical request.
pub(crate) const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Lifetime of the key-pair JWT presented to the token endpoint.
pub(crate) const JWT_LIFETIME_SECS: i64 = 60;
/// OAuth grant type for JWT bearer assertions.
pub(crate) const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Identity-provider host suffix for token endpoints.
pub(crate) const IDENTITY_HOST_SUFFIX: &str = "snowflakecomputing.com";
