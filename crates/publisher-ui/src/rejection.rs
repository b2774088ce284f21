//! RFC9457-style 401 response for rejected sessions.

use axum::{
    Json,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::constants::{PROBLEM_CONTENT_TYPE, PROBLEM_UNAUTHORIZED};

/// Problem document returned to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
}

/// Request rejected for lack of a valid session.
///
/// The body is identical for every cause so nothing about the failure leaks
/// to the caller; the cause is logged where the rejection is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRejection;

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: PROBLEM_UNAUTHORIZED.to_string(),
            title: "authentication required".to_string(),
            status: StatusCode::UNAUTHORIZED.as_u16(),
        };
        (
            StatusCode::UNAUTHORIZED,
            [(CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            Json(body),
        )
            .into_response()
    }
}
