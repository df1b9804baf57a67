//! Scripted collaborators for unit tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::availability::{AvailabilityFetcher, AvailabilityPage, AvailabilitySnapshot};
use crate::error::{ChannelError, FetchError};
use crate::live::{PushConnection, PushTransport};
use crate::month::{DayStamp, MonthKey};
use crate::namespace::{NamespaceKey, NamespaceSet};
use crate::sync_status::SyncSnapshot;

/// A fetch waiting for the test to answer it.
pub struct PendingFetch {
    pub month: MonthKey,
    respond: oneshot::Sender<Result<AvailabilityPage, FetchError>>,
}

impl PendingFetch {
    /// Answer the fetch. Returns false when the caller already gave up on it.
    pub fn respond(self, result: Result<AvailabilityPage, FetchError>) -> bool {
        self.respond.send(result).is_ok()
    }
}

/// Fetcher whose every call blocks until the test answers it, so tests
/// decide completion order.
pub struct ScriptedFetcher {
    calls: mpsc::UnboundedSender<PendingFetch>,
}

impl ScriptedFetcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingFetch>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (ScriptedFetcher { calls }, rx)
    }
}

#[async_trait]
impl AvailabilityFetcher for ScriptedFetcher {
    async fn fetch(&self, month: MonthKey) -> Result<AvailabilityPage, FetchError> {
        let (respond, answer) = oneshot::channel();
        self.calls
            .send(PendingFetch { month, respond })
            .map_err(|_| FetchError::Network("script closed".into()))?;
        answer
            .await
            .unwrap_or_else(|_| Err(FetchError::Network("script dropped the call".into())))
    }
}

pub fn month(year: i32, month: u32) -> MonthKey {
    MonthKey::new(year, month).unwrap()
}

pub fn day(s: &str) -> DayStamp {
    DayStamp::parse(s).unwrap()
}

/// A page for `month` with `(namespace, days)` entries.
pub fn page(month: MonthKey, entries: &[(&str, &[&str])]) -> AvailabilityPage {
    let days: BTreeMap<NamespaceKey, BTreeSet<DayStamp>> = entries
        .iter()
        .map(|(ns, days)| (NamespaceKey::new(*ns), days.iter().map(|d| day(d)).collect()))
        .collect();
    AvailabilityPage {
        month,
        snapshot: AvailabilitySnapshot::from_days(days, &NamespaceSet::default()),
        sync_status: None,
    }
}

pub fn sync_snapshot(complete: bool) -> SyncSnapshot {
    SyncSnapshot {
        overall_complete: complete,
        overall_in_progress: !complete,
        completed_count: if complete { 1 } else { 0 },
        failed_count: 0,
        in_progress_count: if complete { 0 } else { 1 },
        total_count: 1,
        overall_percent: if complete { 100.0 } else { 40.0 },
        sources: BTreeMap::new(),
    }
}

/// Server side of a [`FakeTransport`] connection.
pub struct FakeServer {
    push: Mutex<Option<mpsc::UnboundedSender<String>>>,
    received: Arc<Mutex<Vec<String>>>,
    closed_by_client: Arc<AtomicBool>,
}

impl FakeServer {
    /// Send a text message to the client.
    pub fn push(&self, text: &str) {
        if let Some(push) = self.push.lock().unwrap().as_ref() {
            let _ = push.send(text.to_string());
        }
    }

    /// Drop the connection from the server side.
    pub fn disconnect(&self) {
        self.push.lock().unwrap().take();
    }

    /// Messages the client sent, in order.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn closed_by_client(&self) -> bool {
        self.closed_by_client.load(Ordering::SeqCst)
    }
}

struct FakeConnection {
    incoming: mpsc::UnboundedReceiver<String>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
    fail_sends: bool,
}

#[async_trait]
impl PushConnection for FakeConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        if self.fail_sends {
            return Err(ChannelError::Transport("broken pipe".into()));
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, ChannelError>> {
        self.incoming.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Transport that accepts only the connections queued with
/// [`FakeTransport::accept_next`] and refuses the rest.
#[derive(Default)]
pub struct FakeTransport {
    queued: Mutex<VecDeque<FakeConnection>>,
    connects: Mutex<Vec<Instant>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeTransport::default())
    }

    /// Queue a connection for the next connect call.
    pub fn accept_next(&self) -> FakeServer {
        self.queue(false)
    }

    /// Queue a connection that accepts the connect but fails every send.
    pub fn accept_next_failing_sends(&self) -> FakeServer {
        self.queue(true)
    }

    fn queue(&self, fail_sends: bool) -> FakeServer {
        let (push, incoming) = mpsc::unbounded_channel();
        let received = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        self.queued.lock().unwrap().push_back(FakeConnection {
            incoming,
            sent: received.clone(),
            closed: closed.clone(),
            fail_sends,
        });
        FakeServer {
            push: Mutex::new(Some(push)),
            received,
            closed_by_client: closed,
        }
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for FakeTransport {
    async fn connect(&self) -> Result<Box<dyn PushConnection>, ChannelError> {
        self.connects.lock().unwrap().push(Instant::now());
        match self.queued.lock().unwrap().pop_front() {
            Some(connection) => Ok(Box::new(connection)),
            None => Err(ChannelError::Connect {
                url: "fake://push".into(),
                reason: "connection refused".into(),
            }),
        }
    }
}
