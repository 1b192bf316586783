//! Allowlist gatekeeper middleware.
//! Allows or rejects each request by the caller's address.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::allowlist::{normalize_str, AllowSet, NormalizedAddress};
use crate::observability::metrics;

/// Path prefixes used by the dev server's own asset, filesystem and
/// hot-reload traffic. Never blocked.
pub const INTERNAL_PREFIXES: [&str; 3] = ["/__vite", "/@fs", "/__hmr"];

/// Header consulted before the socket address.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Body sent with every rejection.
pub const FORBIDDEN_BODY: &str = "Forbidden";

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    InternalPath,
    Localhost,
    EmptyAllowlist,
    Listed,
}

/// Outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(AllowReason),
    Reject(NormalizedAddress),
}

impl Decision {
    fn label(&self) -> &'static str {
        match self {
            Decision::Allow(AllowReason::InternalPath) => "internal_path",
            Decision::Allow(AllowReason::Localhost) => "localhost",
            Decision::Allow(AllowReason::EmptyAllowlist) => "empty_allowlist",
            Decision::Allow(AllowReason::Listed) => "listed",
            Decision::Reject(_) => "rejected",
        }
    }
}

/// Failure while deriving or matching the caller address.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("x-forwarded-for header is not valid text: {0}")]
    InvalidForwardedFor(#[from] axum::http::header::ToStrError),
}

/// Allowlist state shared by every request.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    allowed: AllowSet,
    allow_localhost: bool,
}

impl Gatekeeper {
    pub fn new(allowed: AllowSet, allow_localhost: bool) -> Self {
        Self {
            allowed,
            allow_localhost,
        }
    }

    pub fn allowed(&self) -> &AllowSet {
        &self.allowed
    }

    /// Decide for a request at `path`.
    ///
    /// `forwarded_for` is the raw `X-Forwarded-For` value, `remote` the
    /// socket peer. An empty header value falls back to the socket.
    pub fn decide(
        &self,
        path: &str,
        forwarded_for: Option<&HeaderValue>,
        remote: Option<SocketAddr>,
    ) -> Result<Decision, GateError> {
        if INTERNAL_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return Ok(Decision::Allow(AllowReason::InternalPath));
        }

        let addr = client_address(forwarded_for, remote)?;

        if self.allow_localhost && addr.is_loopback() {
            return Ok(Decision::Allow(AllowReason::Localhost));
        }
        if self.allowed.is_empty() {
            return Ok(Decision::Allow(AllowReason::EmptyAllowlist));
        }
        if self.allowed.contains(&addr) {
            return Ok(Decision::Allow(AllowReason::Listed));
        }

        Ok(Decision::Reject(addr))
    }
}

/// Caller address: first `X-Forwarded-For` hop, else the socket peer IP.
///
/// The header value keeps any port it carries.
fn client_address(
    forwarded_for: Option<&HeaderValue>,
    remote: Option<SocketAddr>,
) -> Result<NormalizedAddress, GateError> {
    if let Some(value) = forwarded_for.filter(|v| !v.is_empty()) {
        let raw = value.to_str()?;
        let first = raw.split(',').next().unwrap_or_default().trim();
        return Ok(normalize_str(first));
    }

    Ok(remote
        .map(|addr| normalize_str(&addr.ip().to_string()))
        .unwrap_or_default())
}

/// Gate registered in front of every other handler.
pub async fn gatekeeper_middleware(
    State(gate): State<Arc<Gatekeeper>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let path = req.uri().path();

    let outcome = gate.decide(path, req.headers().get(X_FORWARDED_FOR), remote);

    // The only place gate errors are swallowed: a fault here must not stop
    // the dev server from serving, so it counts as an allow.
    let decision = match outcome {
        Ok(decision) => decision,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Allowlist check failed, allowing request");
            metrics::record_decision("error");
            return next.run(req).await;
        }
    };

    metrics::record_decision(decision.label());
    match decision {
        Decision::Allow(reason) => {
            tracing::debug!(path = %path, reason = ?reason, "Request allowed");
            next.run(req).await
        }
        Decision::Reject(addr) => {
            tracing::warn!(address = %addr, path = %path, "Request from address not in allowlist");
            forbidden()
        }
    }
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        [(header::CONTENT_TYPE, "text/plain")],
        FORBIDDEN_BODY,
    )
        .into_response()
}
