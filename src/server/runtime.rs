//! Runtime control for [`InverterServer`].

mod accept;
mod backoff;

#[cfg(test)]
pub(super) use accept::MockAcceptListener;
pub(super) use accept::{AcceptLoopOptions, accept_loop};
pub use backoff::BackoffConfig;
use futures::Future;
use log::{info, warn};
use tokio::{select, signal};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{Bound, InverterServer, ServerError};

impl InverterServer<Bound> {
    /// Run the server until Ctrl+C is received.
    ///
    /// # Errors
    ///
    /// Currently never fails once bound; accept failures are retried with
    /// exponential back-off. The `Result` leaves room for fatal runtime
    /// errors.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until the `shutdown` future resolves.
    ///
    /// Once `shutdown` completes the accept loop stops taking connections and
    /// this method waits for in-flight connection and dispatch tasks to finish.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::{net::{Ipv4Addr, SocketAddr}, sync::Arc};
    ///
    /// use ginlong_monitor::{publish::ChannelPublisher, server::InverterServer};
    /// use tokio::sync::oneshot;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ginlong_monitor::server::ServerError> {
    /// let (publisher, _records) = ChannelPublisher::new();
    /// let server = InverterServer::new(Arc::new(publisher))
    ///     .bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(server.run_with_shutdown(async {
    ///     let _ = rx.await;
    /// }));
    ///
    /// let _ = tx.send(());
    /// handle.await.expect("join server task")?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn run_with_shutdown<S>(self, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let InverterServer {
            publisher,
            read_timeout,
            backoff_config,
            ready_tx,
            state: Bound { listener },
        } = self;
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        if let Ok(addr) = listener.local_addr() {
            info!("listening for inverter frames: local_addr={addr}");
        }

        tracker.spawn(accept_loop(
            listener,
            publisher,
            AcceptLoopOptions {
                shutdown: shutdown_token.clone(),
                tracker: tracker.clone(),
                backoff: backoff_config,
                read_timeout,
            },
        ));

        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("Failed to send readiness signal: receiver dropped");
        }

        select! {
            () = shutdown => shutdown_token.cancel(),
            () = tracker.wait() => {},
        }

        tracker.close();
        tracker.wait().await;
        info!("inverter listener stopped");
        Ok(())
    }
}
