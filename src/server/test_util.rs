//! Test helpers shared across server modules.

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use async_trait::async_trait;
use rstest::fixture;
use tokio::sync::mpsc::UnboundedReceiver;

use super::{Bound, InverterServer, Unbound};
use crate::{
    frame::RawFrame,
    publish::{ChannelPublisher, PublishError, Publisher},
    record::InverterRecord,
};

/// Publisher whose every call panics.
pub struct PanickingPublisher;

#[async_trait]
impl Publisher for PanickingPublisher {
    async fn publish(&self, _record: &InverterRecord) -> Result<(), PublishError> {
        panic!("publisher exploded")
    }
}

#[fixture]
pub fn unbound_server() -> InverterServer<Unbound> {
    let (publisher, _rx) = ChannelPublisher::new();
    InverterServer::new(Arc::new(publisher))
}

#[fixture]
/// Returns a bound [`StdTcpListener`] on a free port for use in tests.
///
/// Keeping the listener bound prevents race conditions where another
/// process could claim the port between discovery and use.
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("Failed to bind free port listener")
}

#[fixture]
/// Wire bytes of a generating frame with 20.0 °C and 1732 W.
pub fn valid_frame() -> [u8; crate::frame::WIRE_LENGTH] {
    RawFrame {
        temperature: 200,
        pnow: 1000,
        status: crate::record::STATUS_GENERATING,
        ..RawFrame::default()
    }
    .to_bytes()
}

#[must_use]
pub fn listener_addr(listener: &StdTcpListener) -> SocketAddr {
    listener
        .local_addr()
        .expect("failed to get listener address")
}

/// Bind a server on `listener` that forwards records into a channel.
pub fn channel_server(
    listener: StdTcpListener,
) -> (InverterServer<Bound>, UnboundedReceiver<InverterRecord>) {
    let (publisher, rx) = ChannelPublisher::new();
    let server = InverterServer::new(Arc::new(publisher))
        .bind_existing_listener(listener)
        .expect("Failed to bind");
    (server, rx)
}
