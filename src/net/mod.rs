//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bound socket, session cap)
//!     → axum upgrade to WebSocket (distribution::server)
//!     → connection.rs (session ID, live count, drain on shutdown)
//! ```
//!
//! # Design Decisions
//! - A bind failure aborts startup; nothing else in this layer is fatal
//! - Sessions over the cap are refused with 503 instead of queued

pub mod connection;
pub mod listener;

pub use connection::{SessionGuard, SessionId, SessionTracker};
pub use listener::{bind_tcp, ListenError, Listener, SessionLimit};
