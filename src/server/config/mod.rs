//! Configuration utilities for [`InverterServer`].

use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use tokio::sync::oneshot;

use super::{Bound, InverterServer, ServerError, ServerState, Unbound, runtime::BackoffConfig};
use crate::publish::Publisher;

pub mod binding;


/// Port the data logger is usually configured to send to.
pub const DEFAULT_LISTEN_PORT: u16 = 9999;

/// Read deadline applied when none is configured.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Explicit settings for the listener, sourced by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Deadline for the single read on each connection. `None` disables it.
    pub read_timeout: Option<Duration>,
    pub backoff: BackoffConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT)),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            backoff: BackoffConfig::default(),
        }
    }
}

impl InverterServer<Unbound> {
    /// Create an unbound server that hands records to `publisher`.
    ///
    /// The read timeout defaults to [`DEFAULT_READ_TIMEOUT`].
    #[must_use]
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self {
            publisher,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            backoff_config: BackoffConfig::default(),
            ready_tx: None,
            state: Unbound,
        }
    }

    /// Build and bind a server from an explicit [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the listen address cannot be bound.
    pub fn from_config(
        config: ServerConfig,
        publisher: Arc<dyn Publisher>,
    ) -> Result<InverterServer<Bound>, ServerError> {
        Self::new(publisher)
            .read_timeout(config.read_timeout)
            .accept_backoff(config.backoff)
            .bind(config.listen_addr)
    }
}

impl<S> InverterServer<S>
where
    S: ServerState,
{
    /// Bound the single read on each connection. `None` disables the deadline.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Configure the back-off applied when `accept()` fails.
    #[must_use]
    pub fn accept_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff_config = backoff.normalized();
        self
    }

    /// Configure a channel used to signal when the server is ready to accept
    /// connections.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Returns the configured read deadline.
    #[inline]
    #[must_use]
    pub const fn read_timeout_value(&self) -> Option<Duration> { self.read_timeout }

    /// Returns the configured accept back-off.
    #[inline]
    #[must_use]
    pub const fn backoff_config(&self) -> BackoffConfig { self.backoff_config }
}
