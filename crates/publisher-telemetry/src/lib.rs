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

//! Logging and request-tracing primitives shared across the publisher workspace.
//!
//! Layout: `init.rs` (subscriber installation and log format selection),
//! `layers.rs` (request-id layers for the local UI server).

pub mod init;
pub mod layers;

pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{
    REQUEST_ID_HEADER, propagate_request_id_layer, request_id_of, set_request_id_layer,
};
