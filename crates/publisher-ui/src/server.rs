//! Local UI server host.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, http::Request, middleware};
use publisher_telemetry::{build_sha, propagate_request_id_layer, request_id_of, set_request_id_layer};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{Span, info};
use url::Url;

use crate::constants::TOKEN_QUERY_PARAM;
use crate::error::{TrustError, TrustResult};
use crate::session::{cookie_session, require_session, token_session};
use crate::trust::LocalTrust;

/// Where the UI server listens and which page the browser opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalServerConfig {
    /// Listen host.
    pub host: String,
    /// Listen port; `0` picks a free port at bind time.
    pub port: u16,
    /// Initial path, optionally with a `#fragment` for client-side routing.
    pub path: String,
}

impl Default for LocalServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            path: "/".to_string(),
        }
    }
}

/// UI server holding the process's trust material.
///
/// Construction requires an already minted [`LocalTrust`], so no request can
/// be served before the token and cookie key exist.
#[derive(Debug, Clone)]
pub struct LocalServer {
    config: LocalServerConfig,
    trust: Arc<LocalTrust>,
}

impl LocalServer {
    /// Server for `config` guarded by `trust`.
    #[must_use]
    pub const fn new(config: LocalServerConfig, trust: Arc<LocalTrust>) -> Self {
        Self { config, trust }
    }

    /// Listen configuration.
    #[must_use]
    pub const fn config(&self) -> &LocalServerConfig {
        &self.config
    }

    /// Browser URL for the configured page, with the local token when
    /// `include_token` is set.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::InvalidUrl`] when host, port and path do not form
    /// a valid URL.
    pub fn url(&self, include_token: bool) -> TrustResult<Url> {
        let (path, fragment) = match self.config.path.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (self.config.path.as_str(), None),
        };
        let mut url = Url::parse(&format!("http://{}:{}", self.config.host, self.config.port))
            .map_err(|err| TrustError::InvalidUrl {
                detail: err.to_string(),
            })?;
        url.set_path(path);
        if include_token {
            url.query_pairs_mut()
                .append_pair(TOKEN_QUERY_PARAM, self.trust.token().expose());
        }
        url.set_fragment(fragment);
        Ok(url)
    }

    /// Wrap `routes` in the session chain plus request-id and trace layers.
    pub fn router(&self, routes: Router) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "ui.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id_of(request.headers()),
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                },
            );

        routes
            .layer(middleware::from_fn(require_session))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&self.trust),
                cookie_session,
            ))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&self.trust),
                token_session,
            ))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(propagate_request_id_layer())
                    .layer(trace_layer),
            )
    }

    /// Bind the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Bind`] when the address is unavailable.
    pub async fn bind(&self) -> TrustResult<TcpListener> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        TcpListener::bind(&address)
            .await
            .map_err(|source| TrustError::Bind { address, source })
    }

    /// Serve `routes` on `listener` until the process stops.
    ///
    /// The token-free URL is logged; the token-bearing URL is left to the
    /// caller to show the user.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Serve`] when the server fails.
    pub async fn serve(&self, listener: TcpListener, routes: Router) -> TrustResult<()> {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        match self.url(false) {
            Ok(url) => info!(url = %url, bound = ?local, "UI server listening"),
            Err(err) => info!(error = %err, bound = ?local, "UI server listening"),
        }
        axum::serve(listener, self.router(routes).into_make_service())
            .await
            .map_err(|source| TrustError::Serve { source })
    }
}
