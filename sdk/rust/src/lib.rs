//! Client library for the config-plane server.
//!
//! - [`SubscriberClient`]: the subscriber side of the discovery protocol
//! - [`AdminClient`]: thin wrapper over the admin HTTP API

mod admin;
mod client;

pub use admin::AdminClient;
pub use client::{ClientError, Push, SubscriberClient};
