//! Session middleware chain for the local UI server.
//!
//! Layers run in this order, each wrapping the next:
//! [`token_session`] → [`cookie_session`] → [`require_session`] → handler.
//! Only the token check and the final guard ever reject; the cookie check
//! marks the request authenticated through a [`SessionContext`] extension and
//! always calls through.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderMap, HeaderValue, Request, StatusCode,
        header::{COOKIE, LOCATION, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::constants::{SESSION_COOKIE_NAME, TOKEN_QUERY_PARAM};
use crate::rejection::SessionRejection;
use crate::trust::LocalTrust;

/// Marks a request as carrying a verified session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    /// When the presented cookie was issued.
    pub issued_at: DateTime<Utc>,
}

/// Exchange a matching `token` query parameter for a session cookie.
///
/// A match answers with `301` to the same path minus the token and sets the
/// cookie; a mismatch is rejected immediately. Requests without the parameter
/// pass through untouched.
pub async fn token_session(
    State(trust): State<Arc<LocalTrust>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(presented) = query_token(req.uri().query()) else {
        return next.run(req).await;
    };
    if !trust.token().matches(&presented) {
        warn!(path = %req.uri().path(), "rejected request with mismatched local token");
        return SessionRejection.into_response();
    }

    let location = redirect_target(req.uri().path(), req.uri().query());
    let (Ok(location), Ok(cookie)) = (
        HeaderValue::from_str(&location),
        HeaderValue::from_str(&trust.cookies().set_cookie(Utc::now())),
    ) else {
        warn!("could not encode session handoff headers");
        return SessionRejection.into_response();
    };
    info!(path = %req.uri().path(), "local token accepted; issuing session cookie");

    let mut response = StatusCode::MOVED_PERMANENTLY.into_response();
    let headers = response.headers_mut();
    headers.insert(LOCATION, location);
    headers.insert(SET_COOKIE, cookie);
    response
}

/// Verify the session cookie, if any, and record the session on the request.
pub async fn cookie_session(
    State(trust): State<Arc<LocalTrust>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(value) = session_cookie(req.headers()) {
        match trust.cookies().decode(&value, Utc::now()) {
            Ok(claims) => {
                if let Some(issued_at) = DateTime::from_timestamp(claims.issued_at, 0) {
                    req.extensions_mut().insert(SessionContext { issued_at });
                }
            }
            Err(err) => warn!(error = %err, "ignoring invalid session cookie"),
        }
    }
    next.run(req).await
}

/// Reject requests that reached this point without a session.
pub async fn require_session(req: Request<Body>, next: Next) -> Response {
    if req.extensions().get::<SessionContext>().is_none() {
        debug!(path = %req.uri().path(), "unauthenticated request rejected");
        return SessionRejection.into_response();
    }
    next.run(req).await
}

fn query_token(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// `path` with every query parameter except `token` preserved in order.
pub(crate) fn redirect_target(path: &str, query: Option<&str>) -> String {
    let remaining = query
        .map(|query| {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                if key != TOKEN_QUERY_PARAM {
                    serializer.append_pair(&key, &value);
                }
            }
            serializer.finish()
        })
        .unwrap_or_default();
    if remaining.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{remaining}")
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.to_string())
}
