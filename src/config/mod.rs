//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, CLI overrides)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Server settings are read once at startup; SIGHUP reloads resources,
//!   not this file
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, Overrides};
pub use schema::{
    AdminConfig, DistributionConfig, LifecycleConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ServerConfig, SourcesConfig,
};
