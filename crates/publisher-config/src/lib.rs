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

//! Layered, file-backed configuration for federated identity connections.
//!
//! Layout: `model.rs` (connection model), `paths.rs` (environment snapshot and
//! search directories), `source.rs` (file access seam), `store.rs`
//! (resolution rules and `ConnectionStore`).

pub mod error;
pub mod model;
pub mod paths;
pub mod source;
pub mod store;

pub use error::{ConfigError, ConfigResult};
pub use model::{AuthenticatorKind, Connection};
pub use paths::{EnvSnapshot, Platform, search_dirs};
pub use source::{ConfigFs, MemoryFs, OsFs};
pub use store::{ConnectionMap, ConnectionStore, resolve_connections};
