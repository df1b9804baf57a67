//! Live sync-progress subscription with fixed-delay reconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::RequestLifecycleController;
use crate::live::message::{ClientMessage, LiveEvent, interpret};
use crate::live::transport::{PushConnection, PushTransport};
use crate::settings::ReconnectPolicy;
use crate::sync_status::{SyncStatus, SyncStatusTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// Torn down; no further reconnects.
    Closed,
}

/// Something that can re-fetch the visible month when progress moves.
pub trait RefreshTrigger: Send + Sync {
    fn refresh_visible(&self);
}

impl RefreshTrigger for RequestLifecycleController {
    fn refresh_visible(&self) {
        // The ticket is dropped; the request keeps running detached. A fetch
        // already in flight is not cancelled, the refresh follows it.
        let _ = self.request_refresh();
    }
}

/// A running push subscription.
///
/// The channel task owns the socket. It reconnects after a fixed delay for
/// as long as it runs, and stops on its own once a sync snapshot received
/// after [`LiveStatusChannel::open`] reports ingestion complete. Dropping or
/// closing the channel cancels any pending reconnect.
pub struct LiveStatusChannel {
    state: watch::Receiver<ChannelState>,
    attempts: Arc<AtomicU64>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveStatusChannel {
    pub fn open(
        transport: Arc<dyn PushTransport>,
        tracker: SyncStatusTracker,
        refresher: Arc<dyn RefreshTrigger>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (state_tx, state) = watch::channel(ChannelState::Disconnected);
        let attempts = Arc::new(AtomicU64::new(0));
        let cancel = CancellationToken::new();

        // Only snapshots arriving from now on may close the channel.
        let mut status = tracker.subscribe();
        let _ = status.borrow_and_update();

        let runner = ChannelRunner {
            transport,
            tracker,
            refresher,
            policy,
            state: state_tx,
            attempts: Arc::clone(&attempts),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(runner.run(status));

        LiveStatusChannel {
            state,
            attempts,
            cancel,
            task: Some(task),
        }
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Connection attempts made so far, the first one included.
    pub fn connect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// False once the channel closed itself or was closed.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Tear down: close the socket, cancel any pending reconnect and wait for
    /// the channel task to finish.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LiveStatusChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum SessionEnd {
    /// Socket dropped or never opened; reconnect.
    Dropped,
    SyncComplete,
    Cancelled,
}

struct ChannelRunner {
    transport: Arc<dyn PushTransport>,
    tracker: SyncStatusTracker,
    refresher: Arc<dyn RefreshTrigger>,
    policy: ReconnectPolicy,
    state: watch::Sender<ChannelState>,
    attempts: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl ChannelRunner {
    async fn run(self, mut status: watch::Receiver<SyncStatus>) {
        loop {
            match self.connect_and_listen(&mut status).await {
                SessionEnd::Cancelled => break,
                SessionEnd::SyncComplete => {
                    tracing::info!("ingestion complete; closing push channel");
                    break;
                }
                SessionEnd::Dropped => {}
            }

            self.state.send_replace(ChannelState::Disconnected);
            tracing::debug!(delay = ?self.policy.delay, "push channel reconnect scheduled");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = sync_completed(&mut status) => {
                    tracing::info!("ingestion complete while disconnected; not reconnecting");
                    break;
                }
                _ = tokio::time::sleep(self.policy.delay) => {}
            }
        }

        self.state.send_replace(ChannelState::Closed);
    }

    async fn connect_and_listen(&self, status: &mut watch::Receiver<SyncStatus>) -> SessionEnd {
        self.state.send_replace(ChannelState::Connecting);
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        let connected = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
            result = self.transport.connect() => result,
        };
        let mut connection = match connected {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(error = %e, attempt, "push channel connect failed");
                return SessionEnd::Dropped;
            }
        };

        if let Err(e) = self.send_subscribe(connection.as_mut()).await {
            tracing::warn!(error = %e, "push channel subscribe failed");
            return SessionEnd::Dropped;
        }
        self.state.send_replace(ChannelState::Connected);
        tracing::info!(attempt, "push channel connected");

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    connection.close().await;
                    return SessionEnd::Cancelled;
                }
                _ = sync_completed(status) => {
                    connection.close().await;
                    return SessionEnd::SyncComplete;
                }
                next = connection.next_text() => next,
            };

            match next {
                Some(Ok(text)) => self.handle_message(&text),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "push channel error");
                    return SessionEnd::Dropped;
                }
                None => {
                    tracing::info!("push channel closed by server");
                    return SessionEnd::Dropped;
                }
            }
        }
    }

    async fn send_subscribe(
        &self,
        connection: &mut dyn PushConnection,
    ) -> Result<(), crate::error::ChannelError> {
        let subscribe = serde_json::to_string(&ClientMessage::subscribe())?;
        connection.send_text(subscribe).await
    }

    fn handle_message(&self, text: &str) {
        match interpret(text) {
            Ok(LiveEvent::Snapshot(snapshot)) => {
                let was_complete = self.tracker.is_complete();
                let now_complete = snapshot.overall_complete;
                self.tracker.apply(snapshot);
                // Pick up whatever the last ingestion step produced.
                if now_complete && !was_complete {
                    self.refresher.refresh_visible();
                }
            }
            Ok(LiveEvent::ProgressChanged) => self.refresher.refresh_visible(),
            Ok(LiveEvent::Ignored(kind)) => tracing::debug!(%kind, "ignoring push message"),
            Err(e) => tracing::warn!(error = %e, "dropping malformed push message"),
        }
    }
}

/// Resolves once the tracker reports a complete snapshot it hadn't already
/// shown this receiver.
async fn sync_completed(status: &mut watch::Receiver<SyncStatus>) {
    loop {
        if status.changed().await.is_err() {
            // Tracker gone; completion can never be observed.
            std::future::pending::<()>().await;
        }
        if status.borrow_and_update().is_complete() {
            return;
        }
    }
}
