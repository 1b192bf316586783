//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → DevConfig (validated, immutable)
//!     → AllowlistOptions handed to the plugin once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_or_default, validated, ConfigError};
pub use schema::AllowlistOptions;
pub use schema::DevConfig;
pub use schema::EnvFiles;
pub use schema::ObservabilityConfig;
pub use schema::ServerConfig;
pub use validation::ValidationError;
