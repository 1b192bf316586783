//! Allowlist subsystem.
//!
//! # Data Flow
//! ```text
//! AllowlistOptions.allowlist ──────────────┐
//!                                          ├─▶ normalize.rs ─▶ AllowSet (immutable)
//! .env, .env.<mode> → env_file.rs ─────────┘
//!                                                     │
//!                                                     ▼
//!                                     shared via Arc with the gatekeeper
//! ```

pub mod assembler;
pub mod env_file;
pub mod normalize;

pub use assembler::AllowSet;
pub use normalize::{normalize, normalize_str, NormalizedAddress};
