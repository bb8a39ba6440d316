//! Accept-loop utilities for server runtime.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use log::warn;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::{Duration, sleep},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::backoff::BackoffConfig;
use crate::{publish::Publisher, server::connection::spawn_connection_task};

/// Abstraction for sources of incoming connections consumed by the accept loop.
///
/// Implementations must be cancellation-safe: dropping a pending `accept()`
/// future must not leak resources.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub(in crate::server) trait AcceptListener: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl AcceptListener for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { TcpListener::local_addr(self) }
}

#[derive(Debug, Clone)]
pub(in crate::server) struct AcceptLoopOptions {
    pub shutdown: CancellationToken,
    pub tracker: TaskTracker,
    pub backoff: BackoffConfig,
    pub read_timeout: Option<Duration>,
}

/// Accepts incoming connections and spawns one handler task per connection.
///
/// The loop never waits on a previous connection. Failures to accept trigger
/// an exponential back-off governed by `options.backoff`. The loop terminates
/// when `options.shutdown` is cancelled; every spawned task is tracked by
/// `options.tracker` so shutdown can wait for them.
pub(in crate::server) async fn accept_loop<L>(
    listener: Arc<L>,
    publisher: Arc<dyn Publisher>,
    options: AcceptLoopOptions,
) where
    L: AcceptListener + Send + Sync + 'static,
{
    let backoff = options.backoff.normalized();
    debug_assert!(
        backoff.initial_delay <= backoff.max_delay,
        "BackoffConfig invariant violated: initial_delay > max_delay"
    );
    let options = AcceptLoopOptions { backoff, ..options };
    let mut delay = backoff.initial_delay;
    while let Some(next_delay) = accept_iteration(&listener, &publisher, &options, delay).await {
        delay = next_delay;
    }
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn accept_iteration<L>(
    listener: &Arc<L>,
    publisher: &Arc<dyn Publisher>,
    options: &AcceptLoopOptions,
    delay: Duration,
) -> Option<Duration>
where
    L: AcceptListener + Send + Sync + 'static,
{
    select! {
        biased;

        () = options.shutdown.cancelled() => None,
        res = listener.accept() => Some(match res {
            Ok((stream, peer_addr)) => {
                spawn_connection_task(
                    stream,
                    peer_addr,
                    Arc::clone(publisher),
                    options.read_timeout,
                    &options.tracker,
                );
                options.backoff.initial_delay
            }
            Err(e) => {
                let local_addr = listener.local_addr().ok();
                warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                sleep(delay).await;
                options.backoff.next_delay(delay)
            }
        }),
    }
}
