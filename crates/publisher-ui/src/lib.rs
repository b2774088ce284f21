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

//! Local trust handoff and session middleware for the browser UI.
//!
//! [`LocalTrust::mint`] creates the process's one-time token and cookie key;
//! [`LocalServer::router`] wraps UI routes so that every handler runs only for
//! browsers that completed the token handoff.

pub mod constants;
pub mod error;
pub mod rejection;
pub mod server;
pub mod session;
pub mod trust;

pub use error::{CookieError, TrustError, TrustResult};
pub use rejection::{ProblemDetails, SessionRejection};
pub use server::{LocalServer, LocalServerConfig};
pub use session::{SessionContext, cookie_session, require_session, token_session};
pub use trust::{LocalToken, LocalTrust, SessionClaims, SessionCookieCodec};
