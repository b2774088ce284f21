use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Json, Router};
use publisher_telemetry::build_sha;
use publisher_ui::{LocalServer, LocalServerConfig, LocalTrust, SessionContext};
use serde::Serialize;
use tracing::info;

use crate::cli::UiArgs;
use crate::client::{CliError, CliResult};

const LANDING_PAGE: &str = "<!doctype html><title>Publisher</title><p>Publisher is running.</p>";

#[derive(Debug, Serialize)]
struct StatusBody {
    version: &'static str,
    build_sha: &'static str,
    session_issued_at: String,
}

/// Mint the local trust material, bind the UI server and print the
/// token-bearing URL for the browser.
pub(crate) async fn handle_ui(args: UiArgs) -> CliResult<()> {
    let trust = Arc::new(LocalTrust::mint().map_err(CliError::failure)?);
    let requested = LocalServerConfig {
        host: args.host,
        port: args.port,
        path: args.path,
    };
    let listener = LocalServer::new(requested.clone(), Arc::clone(&trust))
        .bind()
        .await
        .map_err(CliError::failure)?;
    let port = listener.local_addr().map_err(CliError::failure)?.port();
    let server = LocalServer::new(LocalServerConfig { port, ..requested }, trust);

    let url = server.url(true).map_err(CliError::failure)?;
    info!(port, "UI server bound");
    println!("{url}");

    server
        .serve(listener, routes())
        .await
        .map_err(CliError::failure)
}

fn routes() -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/api/status", get(status))
}

async fn landing() -> axum::response::Html<&'static str> {
    axum::response::Html(LANDING_PAGE)
}

async fn status(Extension(session): Extension<SessionContext>) -> Json<StatusBody> {
    Json(StatusBody {
        version: env!("CARGO_PKG_VERSION"),
        build_sha: build_sha(),
        session_issued_at: session.issued_at.to_rfc3339(),
    })
}
