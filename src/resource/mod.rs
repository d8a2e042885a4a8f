//! Resource model and decoding subsystem.
//!
//! # Data Flow
//! ```text
//! resource file (.json / .toml / .bin)
//!     → decoder.rs (envelope + typed payload)
//!     → validation.rs (per-type semantic checks)
//!     → Resource (tagged enum, immutable)
//!     → classify.rs (kind or Unrecognized)
//! ```
//!
//! # Design Decisions
//! - Resources are a closed tagged enum, so classification is an exhaustive
//!   match rather than a runtime type check
//! - Decoding never panics on bad input; every failure is a `DecodeError`
//! - encode.rs is the inverse used for pushes and for writing `.bin` files

pub mod classify;
pub mod decoder;
pub mod encode;
pub mod kind;
pub mod types;
pub mod validation;

pub use classify::{classify, Classification};
pub use decoder::{decode_file, is_decodable, DecodeError, Encoding};
pub use kind::{PerKind, ResourceKind};
pub use types::{Cluster, EndpointAssignment, Listener, Resource, RouteConfiguration};
