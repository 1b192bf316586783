//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address kept as ConnectInfo)
//!     → server.rs (Axum setup, trace + timeout layers)
//!     → middleware/gatekeeper.rs (allow, or 403 Forbidden)
//!     → server.rs forward_handler (hyper client → upstream dev server)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use server::{HttpServer, ServerError};
