//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Register the allowlist plugin ahead of the handler
//! - Wire up middleware (timeout, tracing)
//! - Serve with peer addresses available to the gatekeeper
//! - Forward allowed requests to the upstream dev server

use axum::{
    body::Body,
    extract::State,
    http::{
        header,
        uri::{Authority, InvalidUri, PathAndQuery, Scheme},
        HeaderValue, Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::lifecycle::shutdown;
use crate::plugin::AllowlistPlugin;

/// Error type for server setup and serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid upstream '{upstream}': {source}")]
    InvalidUpstream {
        upstream: String,
        #[source]
        source: InvalidUri,
    },
    #[error("server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// State injected into the forwarding handler.
#[derive(Clone)]
pub struct ForwardState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// Dev front: allowlist gate plus forwarding to the upstream dev server.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server forwarding to `config.upstream`, gated by `plugin`.
    pub fn new(config: ServerConfig, plugin: &AllowlistPlugin) -> Result<Self, ServerError> {
        let upstream: Authority =
            config
                .upstream
                .parse()
                .map_err(|source| ServerError::InvalidUpstream {
                    upstream: config.upstream.clone(),
                    source,
                })?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = ForwardState { client, upstream };

        let router = Self::build_router(&config, plugin, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, plugin: &AllowlistPlugin, state: ForwardState) -> Router {
        let routes = Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(state);

        plugin
            .configure_server(routes)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Forward a request to the upstream dev server.
async fn forward_handler(State(state): State<ForwardState>, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Cannot build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    // The upstream dev server checks Host against its own name.
    if let Ok(host) = HeaderValue::from_str(state.upstream.as_str()) {
        parts.headers.insert(header::HOST, host);
    }

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(path = %path, upstream = %state.upstream, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
