use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};

use crate::ChatError;
use crate::models::{Identity, Message};

use super::{ChatListener, ConversationFetcher, MessageStore};

/// Identifies one issued conversation fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTag {
    pub peer: Identity,
    pub seq: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Activation {
    peer: Identity,
    id: u64,
}

/// Hands out request tags and writes fetch results into the store only while
/// they are still current.
///
/// A result is current when no newer request was issued for the same peer.
/// Results of a sync tick additionally require their activation to still be
/// the active one. Both checks and the store write happen under one lock, so
/// once `deactivate` returns no write for that activation can follow.
pub struct RequestLedger {
    store: Arc<MessageStore>,
    state: Mutex<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    last_seq: u64,
    last_activation: u64,
    latest: HashMap<Identity, u64>,
    active: Option<Activation>,
}

impl RequestLedger {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self {
            store,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn issue(&self, peer: Identity) -> RequestTag {
        let mut state = self.state.lock();
        state.last_seq += 1;
        let seq = state.last_seq;
        state.latest.insert(peer, seq);
        RequestTag { peer, seq }
    }

    /// Writes `messages` if `tag` is still the latest request for its peer.
    pub fn apply(&self, tag: RequestTag, messages: Vec<Message>) -> bool {
        let state = self.state.lock();
        self.apply_locked(&state, tag, messages)
    }

    pub fn active_peer(&self) -> Option<Identity> {
        self.state.lock().active.map(|v| v.peer)
    }

    fn activate(&self, peer: Identity) -> Activation {
        let mut state = self.state.lock();
        state.last_activation += 1;
        let activation = Activation {
            peer,
            id: state.last_activation,
        };
        if let Some(previous) = state.active.replace(activation) {
            tracing::debug!(peer = %previous.peer, "Superseded active conversation");
        }
        activation
    }

    fn deactivate(&self, activation: Activation) -> bool {
        let mut state = self.state.lock();
        if state.active == Some(activation) {
            state.active = None;
            return true;
        }
        false
    }

    fn apply_active(&self, activation: Activation, tag: RequestTag, messages: Vec<Message>) -> bool {
        let state = self.state.lock();
        if state.active != Some(activation) {
            tracing::debug!(peer = %tag.peer, seq = tag.seq, "Discarding response for inactive conversation");
            return false;
        }
        self.apply_locked(&state, tag, messages)
    }

    fn apply_locked(&self, state: &LedgerState, tag: RequestTag, messages: Vec<Message>) -> bool {
        if state.latest.get(&tag.peer) != Some(&tag.seq) {
            tracing::debug!(peer = %tag.peer, seq = tag.seq, "Discarding stale response");
            return false;
        }
        self.store.replace(tag.peer, messages);
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// Initial fetch not finished yet.
    Starting,
    /// Last tick succeeded.
    Synced,
    /// Last tick failed with a transient error; polling goes on.
    Failing(ChatError),
    /// Stopped on an authentication failure until restarted.
    Halted(ChatError),
    Cancelled,
}

/// Polls the active conversation at a fixed interval.
pub struct SyncLoop {
    fetcher: ConversationFetcher,
    ledger: Arc<RequestLedger>,
    listener: Arc<dyn ChatListener>,
    interval: Duration,
}

impl SyncLoop {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);

    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn new(
        fetcher: ConversationFetcher,
        ledger: Arc<RequestLedger>,
        listener: Arc<dyn ChatListener>,
        interval: Duration,
    ) -> Self {
        assert!(!interval.is_zero(), "poll interval must be positive");
        Self {
            fetcher,
            ledger,
            listener,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Makes `peer` the active conversation. The first fetch runs right away,
    /// later ones every interval until the handle is cancelled or a tick
    /// fails authentication. Any previously active conversation stops
    /// writing to the store.
    ///
    /// An authentication failure on the first fetch is reported only through
    /// [`SyncHandle::synced`]; later ones go to the listener.
    pub fn start(&self, peer: Identity) -> SyncHandle {
        let activation = self.ledger.activate(peer);
        let status = Arc::new(watch::Sender::new(SyncStatus::Starting));
        let task = SyncTask {
            activation,
            fetcher: self.fetcher.clone(),
            ledger: self.ledger.clone(),
            listener: self.listener.clone(),
            interval: self.interval,
            status: status.clone(),
        };
        tracing::debug!(%peer, "Starting conversation sync");
        let task = tokio::spawn(task.run()).abort_handle();
        SyncHandle {
            activation,
            ledger: self.ledger.clone(),
            status,
            task,
        }
    }
}

/// Controls one activation of the sync loop.
#[derive(Clone)]
pub struct SyncHandle {
    activation: Activation,
    ledger: Arc<RequestLedger>,
    status: Arc<watch::Sender<SyncStatus>>,
    task: AbortHandle,
}

impl SyncHandle {
    pub fn peer(&self) -> Identity {
        self.activation.peer
    }

    /// Stops polling. No store write for this activation happens after this
    /// returns, even if a fetch is still in flight. Safe to call repeatedly.
    pub fn cancel(&self) {
        if self.ledger.deactivate(self.activation) {
            tracing::debug!(peer = %self.activation.peer, "Cancelled conversation sync");
        }
        self.task.abort();
        self.status.send_if_modified(|status| match status {
            SyncStatus::Halted(_) | SyncStatus::Cancelled => false,
            _ => {
                *status = SyncStatus::Cancelled;
                true
            }
        });
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.status.borrow(), SyncStatus::Cancelled)
    }

    pub fn is_halted(&self) -> bool {
        matches!(*self.status.borrow(), SyncStatus::Halted(_))
    }

    /// Waits for the outcome of the first fetch. Only an authentication
    /// failure is returned as an error; transient failures leave the loop
    /// polling and resolve `Ok`.
    pub async fn synced(&self) -> Result<(), ChatError> {
        let mut rx = self.status.subscribe();
        let status = match rx.wait_for(|v| *v != SyncStatus::Starting).await {
            Ok(v) => v.clone(),
            Err(_) => return Ok(()),
        };
        match status {
            SyncStatus::Halted(err) => Err(err),
            _ => Ok(()),
        }
    }
}

/// Moves to `next` unless the handle was cancelled. Returns whether it did.
fn advance_status(status: &watch::Sender<SyncStatus>, next: SyncStatus) -> bool {
    status.send_if_modified(|current| {
        if *current == SyncStatus::Cancelled {
            return false;
        }
        *current = next;
        true
    })
}

struct SyncTask {
    activation: Activation,
    fetcher: ConversationFetcher,
    ledger: Arc<RequestLedger>,
    listener: Arc<dyn ChatListener>,
    interval: Duration,
    status: Arc<watch::Sender<SyncStatus>>,
}

impl SyncTask {
    async fn run(self) {
        let peer = self.activation.peer;
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tracing::trace!(%peer, "Poll tick");
            match self.tick().await {
                Ok(()) => {
                    advance_status(&self.status, SyncStatus::Synced);
                }
                Err(err) if err.is_auth() => {
                    tracing::warn!(%peer, ?err, "Conversation sync halted");
                    self.ledger.deactivate(self.activation);
                    // A failing first fetch reaches the caller through `synced()`.
                    let first = *self.status.borrow() == SyncStatus::Starting;
                    if advance_status(&self.status, SyncStatus::Halted(err.clone())) && !first {
                        self.listener.on_sync_halted(peer, err).await;
                    }
                    return;
                }
                Err(err) => {
                    tracing::warn!(%peer, ?err, "Poll tick failed");
                    advance_status(&self.status, SyncStatus::Failing(err));
                }
            }
        }
    }

    async fn tick(&self) -> Result<(), ChatError> {
        let peer = self.activation.peer;
        let tag = self.ledger.issue(peer);
        // A fetch still pending when the next tick is due is overtaken by it.
        let messages = match timeout(self.interval, self.fetcher.fetch(peer)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ChatError::Network(format!(
                    "fetch did not complete within {:?}",
                    self.interval
                )));
            }
        };
        if self
            .ledger
            .apply_active(self.activation, tag, messages.clone())
        {
            self.listener.on_conversation_updated(peer, messages).await;
        }
        Ok(())
    }
}
