//! Address allowlist for local development servers.
//!
//! Requests reaching the dev server are allowed or rejected by caller
//! address. The allowlist is assembled once from explicit options and from
//! `KEY=VALUE` declarations in `.env` files, then enforced by an axum
//! middleware registered through [`AllowlistPlugin::configure_server`].

pub mod allowlist;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod plugin;

pub use allowlist::{AllowSet, NormalizedAddress};
pub use config::{AllowlistOptions, DevConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use plugin::AllowlistPlugin;
