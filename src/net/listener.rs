//! Discovery listener with a session cap.
//!
//! # Responsibilities
//! - Bind the configured address; failure here is fatal at startup
//! - Own the semaphore that caps concurrent sessions

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

/// Error type for listener operations. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),
    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),
}

/// A bound listener plus its session limit.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
    session_limit: Arc<Semaphore>,
}

impl Listener {
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenError> {
        let (inner, local_addr) = bind_tcp(&config.bind_address).await?;

        tracing::info!(
            address = %local_addr,
            max_sessions = config.max_sessions,
            "Discovery listener bound"
        );

        Ok(Self {
            inner,
            local_addr,
            session_limit: Arc::new(Semaphore::new(config.max_sessions)),
        })
    }

    /// The actual bound address (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn session_limit(&self) -> SessionLimit {
        SessionLimit(Arc::clone(&self.session_limit))
    }

    pub fn into_inner(self) -> TcpListener {
        self.inner
    }
}

/// Bind a plain TCP socket, resolving the actual local address.
pub async fn bind_tcp(address: &str) -> Result<(TcpListener, SocketAddr), ListenError> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|_| ListenError::InvalidAddress(address.to_string()))?;
    let listener = TcpListener::bind(addr).await.map_err(|e| ListenError::Bind(addr, e))?;
    let local_addr = listener.local_addr().map_err(|e| ListenError::Bind(addr, e))?;
    Ok((listener, local_addr))
}

/// Cloneable handle on the session cap.
#[derive(Debug, Clone)]
pub struct SessionLimit(Arc<Semaphore>);

impl SessionLimit {
    /// Claim a slot without waiting. `None` when the cap is reached.
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.0).try_acquire_owned().ok()
    }

    #[cfg(test)]
    pub fn available(&self) -> usize {
        self.0.available_permits()
    }
}
