//! Per-connection handling for [`InverterServer`](super::InverterServer).
//!
//! Each connection carries exactly one frame: the stream is read once, the
//! byte count is checked against
//! [`WIRE_LENGTH`](crate::frame::WIRE_LENGTH), and the socket is closed.
//! Valid frames go to a separate dispatch task so the connection is torn down
//! before decoding and publishing finish.

use std::{any::Any, io, net::SocketAddr, sync::Arc, time::Duration};

use bytes::BytesMut;
use futures::FutureExt;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    net::TcpStream,
    time::timeout,
};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use super::DispatchError;
use crate::{
    frame::{FrameError, check_wire_length},
    metrics,
    publish::Publisher,
    record::InverterRecord,
};

/// Capacity of the single read. Larger than a frame so oversized payloads are
/// detected rather than silently truncated to a valid length.
pub(in crate::server) const READ_BUFFER_SIZE: usize = 512;

/// Spawn a task to process a single TCP connection, logging and discarding
/// any panics.
pub(in crate::server) fn spawn_connection_task(
    stream: TcpStream,
    peer_addr: SocketAddr,
    publisher: Arc<dyn Publisher>,
    read_timeout: Option<Duration>,
    tracker: &TaskTracker,
) {
    metrics::inc_connections();
    info!(%peer_addr, "accepted connection");
    let dispatch_tracker = tracker.clone();
    tracker.spawn(async move {
        let fut = std::panic::AssertUnwindSafe(process_stream(
            stream,
            peer_addr,
            publisher,
            read_timeout,
            dispatch_tracker,
        ))
        .catch_unwind();

        if let Err(panic) = fut.await {
            log_panic("connection", &*panic, peer_addr);
        }
    });
}

async fn process_stream(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    publisher: Arc<dyn Publisher>,
    read_timeout: Option<Duration>,
    tracker: TaskTracker,
) {
    let read = read_once(&mut stream, read_timeout).await;
    // One read per connection; the logger expects no reply.
    drop(stream);

    let bytes = match read {
        Ok(bytes) => bytes,
        Err(e) => {
            metrics::inc_rejected("read");
            warn!(error = %e, %peer_addr, "failed to read frame");
            return;
        }
    };

    if let Err(e) = check_wire_length(bytes.len()) {
        reject(&e, &bytes, peer_addr);
        return;
    }

    let frame = bytes.freeze();
    tracker.spawn(async move {
        let fut =
            std::panic::AssertUnwindSafe(dispatch_frame(&frame, publisher.as_ref())).catch_unwind();
        match fut.await {
            Ok(Ok(record)) => {
                info!(%peer_addr, status = %record.status, pnow = record.pnow, "published record");
            }
            Ok(Err(DispatchError::Frame(e))) => reject(&e, &frame, peer_addr),
            Ok(Err(DispatchError::Publish(e))) => {
                metrics::inc_publish_errors();
                error!(error = %e, %peer_addr, "failed to publish record");
            }
            Err(panic) => log_panic("dispatch", &*panic, peer_addr),
        }
    });
}

/// Perform the single bounded read for a connection.
///
/// Returns the bytes received, which may be empty if the peer closed without
/// sending anything.
///
/// # Errors
///
/// Returns the socket error, or [`io::ErrorKind::TimedOut`] if `read_timeout`
/// elapses first.
pub(in crate::server) async fn read_once<R>(
    reader: &mut R,
    read_timeout: Option<Duration>,
) -> io::Result<BytesMut>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);
    let read = reader.read_buf(&mut buf);
    match read_timeout {
        Some(limit) => timeout(limit, read)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "frame read timed out"))??,
        None => read.await?,
    };
    Ok(buf)
}

/// Decode, convert and publish one frame.
///
/// # Errors
///
/// Returns [`DispatchError::Frame`] if the frame is structurally invalid and
/// [`DispatchError::Publish`] if the publisher fails.
pub(in crate::server) async fn dispatch_frame(
    frame: &[u8],
    publisher: &dyn Publisher,
) -> Result<InverterRecord, DispatchError> {
    let record = InverterRecord::from_wire(frame)?;
    publisher.publish(&record).await?;
    metrics::inc_published();
    Ok(record)
}

fn reject(error: &FrameError, bytes: &[u8], peer_addr: SocketAddr) {
    metrics::inc_rejected(error.reason());
    warn!(%error, %peer_addr, "dropping frame");
    if !bytes.is_empty() {
        let raw = format!("{bytes:02x?}");
        warn!(%peer_addr, %raw, "dropped frame bytes");
    }
}

fn log_panic(task: &str, panic: &(dyn Any + Send), peer_addr: SocketAddr) {
    metrics::inc_task_panics();
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&'static str>().copied())
        .unwrap_or("<non-string panic payload>");
    error!(task, panic = message, %peer_addr, "task panicked");
}

#[cfg(test)]
mod tests;
