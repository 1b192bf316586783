//! Plugin construction interface.
//!
//! The host builds the plugin once from [`AllowlistOptions`]; the allowlist
//! is assembled right away and then shared read-only with every request
//! through [`AllowlistPlugin::configure_server`].

use std::sync::Arc;

use axum::{middleware, Router};

use crate::allowlist::AllowSet;
use crate::config::AllowlistOptions;
use crate::http::middleware::{gatekeeper_middleware, Gatekeeper};
use crate::observability::metrics;

pub const PLUGIN_NAME: &str = "dev-allowlist";

/// Allowlist plugin for a development server.
#[derive(Debug, Clone)]
pub struct AllowlistPlugin {
    gate: Arc<Gatekeeper>,
}

impl AllowlistPlugin {
    /// Assemble the allowlist, resolving env files against the working directory.
    pub fn new(options: AllowlistOptions) -> Self {
        Self::with_allow_set(AllowSet::assemble(&options), options.allow_localhost)
    }

    /// Build from an already assembled set.
    pub fn with_allow_set(allowed: AllowSet, allow_localhost: bool) -> Self {
        metrics::record_allowlist_size(allowed.len());
        Self {
            gate: Arc::new(Gatekeeper::new(allowed, allow_localhost)),
        }
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn allowed(&self) -> &AllowSet {
        self.gate.allowed()
    }

    /// Register the gatekeeper on `router`.
    ///
    /// Apply this after the routes and before any layer that should only
    /// see allowed traffic.
    pub fn configure_server<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(
            self.gate.clone(),
            gatekeeper_middleware,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvFiles;
    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode},
        routing::get,
    };
    use std::fs;
    use std::net::SocketAddr;
    use std::path::Path;
    use tower::ServiceExt;

    fn plugin_in(options: &AllowlistOptions, base: &Path) -> AllowlistPlugin {
        AllowlistPlugin::with_allow_set(
            AllowSet::assemble_in(options, base),
            options.allow_localhost,
        )
    }

    async fn status_from(plugin: &AllowlistPlugin, from: &str) -> StatusCode {
        let app = plugin.configure_server(Router::new().route("/", get(|| async { "ok" })));
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo::<SocketAddr>(from.parse().unwrap()));
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_env_file_addresses_are_enforced() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".env"),
            "VITE_WEB_SERVER=192.168.1.10:5173,192.168.1.11\n",
        )
        .unwrap();
        let options = AllowlistOptions {
            env_files: Some(EnvFiles::One(".env".into())),
            ..AllowlistOptions::default()
        };
        let plugin = plugin_in(&options, dir.path());

        assert_eq!(plugin.allowed().sorted(), vec!["192.168.1.10", "192.168.1.11"]);
        assert_eq!(status_from(&plugin, "192.168.1.10:50000").await, StatusCode::OK);
        assert_eq!(status_from(&plugin, "[::ffff:192.168.1.11]:50000").await, StatusCode::OK);
        assert_eq!(status_from(&plugin, "192.168.1.12:50000").await, StatusCode::FORBIDDEN);
        assert_eq!(status_from(&plugin, "127.0.0.1:50000").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_configuration_allows_everyone() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = plugin_in(&AllowlistOptions::default(), dir.path());

        assert!(plugin.allowed().is_empty());
        assert_eq!(status_from(&plugin, "198.51.100.7:1").await, StatusCode::OK);
    }

    #[test]
    fn test_construction_publishes_allowlist_gauge() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let options = AllowlistOptions {
            allowlist: vec!["10.0.0.5".into(), "10.0.0.6".into()],
            env_files: Some(EnvFiles::Many(Vec::new())),
            ..AllowlistOptions::default()
        };

        ::metrics::with_local_recorder(&recorder, || {
            plugin_in(&options, Path::new("."));
        });

        assert!(handle.render().contains("dev_allowlist_entries 2"));
    }

    #[test]
    fn test_name() {
        let plugin = AllowlistPlugin::with_allow_set(AllowSet::default(), true);
        assert_eq!(plugin.name(), "dev-allowlist");
    }
}
