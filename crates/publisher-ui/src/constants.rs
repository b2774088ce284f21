//! Fixed names and limits for the local UI trust handoff.

/// Query parameter carrying the one-time local token.
pub const TOKEN_QUERY_PARAM: &str = "token";
/// Session cookie set after a successful token handoff.
pub const SESSION_COOKIE_NAME: &str = "publisher_session";
/// Attributes appended to the session cookie. No `Secure`: the local server
/// speaks plain HTTP.
pub(crate) const SESSION_COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; SameSite=None";
/// Session cookies older than this are rejected.
pub const SESSION_MAX_AGE_DAYS: i64 = 30;
/// Allowed clock skew for cookies stamped slightly in the future.
pub(crate) const SESSION_CLOCK_SKEW_SECS: i64 = 60;

pub(crate) const LOCAL_TOKEN_BYTES: usize = 32;
pub(crate) const COOKIE_KEY_BYTES: usize = 32;

pub(crate) const PROBLEM_UNAUTHORIZED: &str = "https://publisher.dev/problems/unauthorized";
pub(crate) const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";
