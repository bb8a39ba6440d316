//! Tokio-based listener for inverter telemetry connections.
//!
//! [`InverterServer`] accepts TCP connections from the data logger, reads a
//! single frame from each, and dispatches valid frames to a [`Publisher`] in a
//! task of their own. Nothing is ever written back to the client.

use std::{sync::Arc, time::Duration};

use tokio::{net::TcpListener, sync::oneshot};

use crate::publish::Publisher;

/// Listener for inverter frames.
///
/// The server carries a typestate `S` indicating whether it is [`Unbound`]
/// (no TCP listener yet) or [`Bound`]. New servers start `Unbound` and must
/// call [`bind`](InverterServer::bind) or
/// [`bind_existing_listener`](InverterServer::bind_existing_listener) before
/// they can run.
pub struct InverterServer<S = Unbound>
where
    S: ServerState,
{
    pub(crate) publisher: Arc<dyn Publisher>,
    /// Deadline for the single read on each connection. `None` waits forever.
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) backoff_config: BackoffConfig,
    /// Fired once the accept loop is running. Single use.
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    pub(crate) state: S,
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug, Clone)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

mod config;
pub use config::{DEFAULT_LISTEN_PORT, DEFAULT_READ_TIMEOUT, ServerConfig, binding};
mod connection;
pub mod error;
mod runtime;

pub use error::{DispatchError, ServerError};
pub use runtime::BackoffConfig;

#[cfg(test)]
pub(crate) mod test_util;
