//! Listener binding for [`InverterServer`].

use std::{
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use tokio::net::TcpListener;

use super::{ServerState, Unbound};
use crate::server::{Bound, InverterServer, ServerError};

impl<S> InverterServer<S>
where
    S: ServerState,
{
    fn bind_to_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<InverterServer<Bound>, ServerError> {
        let InverterServer {
            publisher,
            read_timeout,
            backoff_config,
            ready_tx,
            ..
        } = self;

        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Bind)?;
        let tokio_listener = TcpListener::from_std(std_listener).map_err(ServerError::Bind)?;

        Ok(InverterServer {
            publisher,
            read_timeout,
            backoff_config,
            ready_tx,
            state: Bound {
                listener: Arc::new(tokio_listener),
            },
        })
    }
}

impl InverterServer<Unbound> {
    /// Return `None` as the server is not bound.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> { None }

    /// Bind to a fresh address.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::{net::{Ipv4Addr, SocketAddr}, sync::Arc};
    ///
    /// use ginlong_monitor::{publish::ChannelPublisher, server::InverterServer};
    ///
    /// let (publisher, _records) = ChannelPublisher::new();
    /// # let rt = tokio::runtime::Runtime::new().unwrap();
    /// # let _guard = rt.enter();
    /// let server = InverterServer::new(Arc::new(publisher))
    ///     .bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
    ///     .expect("bind failed");
    /// assert!(server.local_addr().is_some());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if binding or configuring the listener
    /// fails.
    pub fn bind(self, addr: SocketAddr) -> Result<InverterServer<Bound>, ServerError> {
        let std_listener = StdTcpListener::bind(addr).map_err(ServerError::Bind)?;
        self.bind_existing_listener(std_listener)
    }

    /// Bind to an existing `StdTcpListener`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if configuring the listener fails.
    pub fn bind_existing_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<InverterServer<Bound>, ServerError> {
        self.bind_to_listener(std_listener)
    }
}

impl InverterServer<Bound> {
    /// Returns the bound address, or `None` if retrieving it fails.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.listener.local_addr().ok() }
}
