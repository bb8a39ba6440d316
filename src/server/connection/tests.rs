//! Tests for single-read connection handling and frame dispatch.

use std::{io, sync::Arc, time::Duration};

use rstest::rstest;
use tokio::{
    io::{AsyncWriteExt, duplex},
    net::{TcpListener, TcpStream},
};
use tokio_util::task::TaskTracker;
use tracing_test::traced_test;

use super::*;
use crate::{
    frame::{FrameError, PAYLOAD_LENGTH, WIRE_LENGTH},
    publish::{ChannelPublisher, PublishError},
    record::Status,
    server::test_util::{PanickingPublisher, valid_frame},
};

/// Accept one connection on a fresh listener, run it through
/// [`spawn_connection_task`], and wait for every spawned task to finish.
async fn run_single_connection(publisher: Arc<dyn Publisher>, payload: &[u8]) -> SocketAddr {
    let tracker = TaskTracker::new();
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("listener.local_addr");

    let server = tokio::spawn({
        let tracker = tracker.clone();
        async move {
            let (stream, peer_addr) = listener.accept().await.expect("accept");
            spawn_connection_task(stream, peer_addr, publisher, None, &tracker);
        }
    });

    let mut client = TcpStream::connect(addr).await.expect("connect");
    let peer_addr = client.local_addr().expect("client.local_addr");
    client.write_all(payload).await.expect("write payload");
    client.shutdown().await.expect("shutdown client");

    server.await.expect("join accept task");
    // Connection tasks spawn dispatch tasks on the same tracker; closing only
    // after the accept task has run keeps `wait` honest.
    tracker.close();
    tracker.wait().await;
    peer_addr
}

#[tokio::test]
async fn read_once_returns_received_bytes() {
    let (mut client, mut server) = duplex(1024);
    client.write_all(&[1, 2, 3]).await.expect("write");
    let bytes = read_once(&mut server, None).await.expect("read");
    assert_eq!(&bytes[..], &[1, 2, 3]);
}

#[tokio::test]
async fn read_once_returns_empty_on_immediate_close() {
    let (client, mut server) = duplex(64);
    drop(client);
    let bytes = read_once(&mut server, Some(Duration::from_secs(1)))
        .await
        .expect("read");
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn read_once_caps_at_buffer_size() {
    let (mut client, mut server) = duplex(2 * READ_BUFFER_SIZE);
    client
        .write_all(&[0xab; 2 * READ_BUFFER_SIZE])
        .await
        .expect("write");
    let bytes = read_once(&mut server, None).await.expect("read");
    assert!(bytes.len() <= READ_BUFFER_SIZE);
}

#[tokio::test(start_paused = true)]
async fn read_once_times_out_on_silent_peer() {
    let (_client, mut server) = duplex(64);
    let err = read_once(&mut server, Some(Duration::from_secs(30)))
        .await
        .expect_err("silent peer must time out");
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);
}

#[rstest]
#[tokio::test]
async fn dispatch_publishes_converted_record(valid_frame: [u8; WIRE_LENGTH]) {
    let (publisher, mut rx) = ChannelPublisher::new();
    let record = dispatch_frame(&valid_frame, &publisher)
        .await
        .expect("dispatch succeeds");
    assert_eq!(record.temperature, 20.0);
    assert_eq!(record.pnow, 1732);
    assert_eq!(record.status, Status::Generating);
    assert_eq!(rx.try_recv().ok(), Some(record));
}

#[rstest]
#[tokio::test]
async fn dispatch_rejects_bad_declared_length(mut valid_frame: [u8; WIRE_LENGTH]) {
    valid_frame[1] = PAYLOAD_LENGTH - 1;
    let (publisher, mut rx) = ChannelPublisher::new();
    let result = dispatch_frame(&valid_frame, &publisher).await;
    assert!(matches!(
        result,
        Err(DispatchError::Frame(FrameError::InvalidPacketLength { .. }))
    ));
    assert!(rx.try_recv().is_err(), "no record may be published");
}

#[rstest]
#[tokio::test]
async fn dispatch_surfaces_publish_failures(valid_frame: [u8; WIRE_LENGTH]) {
    let (publisher, rx) = ChannelPublisher::new();
    drop(rx);
    let result = dispatch_frame(&valid_frame, &publisher).await;
    assert!(matches!(
        result,
        Err(DispatchError::Publish(PublishError::Closed))
    ));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn valid_frame_is_published(valid_frame: [u8; WIRE_LENGTH]) {
    let (publisher, mut rx) = ChannelPublisher::new();
    run_single_connection(Arc::new(publisher), &valid_frame).await;

    let record = rx.try_recv().expect("record published");
    assert_eq!(record.pnow, 1732);
    assert!(logs_contain("published record"));
}

#[traced_test]
#[tokio::test]
async fn short_frame_is_rejected_before_decode() {
    let (publisher, mut rx) = ChannelPublisher::new();
    let peer_addr = run_single_connection(Arc::new(publisher), &[0x68; 50]).await;

    assert!(rx.try_recv().is_err(), "no record may be published");
    logs_assert(|lines: &[&str]| {
        lines
            .iter()
            .find(|line| {
                line.contains("dropping frame")
                    && line.contains("received 50 bytes, expected 103")
                    && line.contains(&peer_addr.to_string())
            })
            .map(|_| ())
            .ok_or_else(|| "rejection log not found".to_string())
    });
    assert!(logs_contain("dropped frame bytes"));
}

#[traced_test]
#[tokio::test]
async fn empty_connection_logs_mismatch_without_raw_bytes() {
    let (publisher, mut rx) = ChannelPublisher::new();
    run_single_connection(Arc::new(publisher), &[]).await;

    assert!(rx.try_recv().is_err());
    assert!(logs_contain("received 0 bytes"));
    assert!(!logs_contain("dropped frame bytes"));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn wrong_declared_length_is_logged(mut valid_frame: [u8; WIRE_LENGTH]) {
    valid_frame[1] = 0x00;
    let (publisher, mut rx) = ChannelPublisher::new();
    run_single_connection(Arc::new(publisher), &valid_frame).await;

    assert!(rx.try_recv().is_err());
    assert!(logs_contain("invalid packet length: declared 0, expected 89"));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn panicking_publisher_is_contained(valid_frame: [u8; WIRE_LENGTH]) {
    run_single_connection(Arc::new(PanickingPublisher), &valid_frame).await;

    logs_assert(|lines: &[&str]| {
        lines
            .iter()
            .find(|line| {
                line.contains("task panicked")
                    && line.contains("dispatch")
                    && line.contains("publisher exploded")
            })
            .map(|_| ())
            .ok_or_else(|| "panic log not found".to_string())
    });
}
