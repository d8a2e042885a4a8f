//! Distribution subsystem: pushes snapshots to subscribers.
//!
//! # Data Flow
//! ```text
//! subscriber ──WebSocket──▶ server.rs (upgrade, session cap)
//!     → engine.rs (one task per session)
//!         → grouping.rs (node id → store group)
//!         → store.subscribe(group)
//!         → session.rs / subscription.rs (per-kind state, nonces)
//!     ◀── pushes in cluster → endpoint → route → listener order
//! ```
//!
//! # Design Decisions
//! - Every push is the full resource list of one kind (state of the world)
//! - Acks are matched by nonce; the version string is informational
//! - Identical content is not re-pushed unless the policy says so

pub mod engine;
pub mod grouping;
pub mod protocol;
pub mod server;
pub mod session;
pub mod subscription;

pub use engine::{DistributionEngine, TransportError};
pub use grouping::{FixedGroup, GroupResolver};
pub use protocol::{AckMessage, ClientMessage, DiscoveryResponse, NodeId, ServerMessage};
pub use server::{DiscoveryServer, DISCOVERY_PATH};
pub use session::{PushPolicy, Session, SessionStatus};
pub use subscription::{AckOutcome, KindStatus};
