//! config-plane: a file-driven configuration distribution server.
//!
//! Resource files (clusters, endpoint assignments, route configurations,
//! listeners) are read from disk, checked for referential consistency,
//! frozen into versioned snapshots and streamed to subscribers, which
//! acknowledge or reject each push.

// Resource pipeline
pub mod reconcile;
pub mod resource;
pub mod snapshot;
pub mod store;

// Subscriber side
pub mod distribution;
pub mod net;

// Cross-cutting concerns
pub mod admin;
pub mod app;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use app::{ConfigPlane, StartError};
pub use config::ServerConfig;
pub use lifecycle::Shutdown;
