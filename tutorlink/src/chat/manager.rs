use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Mutex as TokioMutex;

use crate::ChatError;
use crate::backend::Backend;
use crate::models::{Identity, Message, User};

use super::{
    ChatListener, ConversationFetcher, MessageStore, RequestLedger, SendCoordinator, StubListener,
    SyncHandle, SyncLoop, SyncStatus, UnreadTracker,
};

/// A peer from the directory together with its current unread count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSummary {
    pub user: User,
    pub unread: usize,
}

/// Conversation surface used by the rest of the application.
pub struct ChatManager {
    viewer: User,
    backend: Arc<dyn Backend>,
    store: Arc<MessageStore>,
    unread: UnreadTracker,
    sync: SyncLoop,
    sender: SendCoordinator,
    active: Mutex<Option<SyncHandle>>,
    send_lock: TokioMutex<()>,
}

impl ChatManager {
    /// Resolves the viewer, then builds the subsystem around it. Nothing
    /// polls until a peer is selected.
    pub async fn connect<B>(backend: Arc<B>) -> Result<Self, ChatError>
    where
        B: Backend + 'static,
    {
        Self::with_listener(backend, Arc::new(StubListener), SyncLoop::DEFAULT_INTERVAL).await
    }

    /// # Panics
    ///
    /// Panics if `poll_interval` is zero.
    pub async fn with_listener<B, L>(
        backend: Arc<B>,
        listener: Arc<L>,
        poll_interval: Duration,
    ) -> Result<Self, ChatError>
    where
        B: Backend + 'static,
        L: ChatListener + 'static,
    {
        let backend: Arc<dyn Backend> = backend;
        let listener: Arc<dyn ChatListener> = listener;
        let viewer = backend.resolve_viewer().await?;
        tracing::info!(viewer = %viewer.id, role = %viewer.role, "Resolved viewer");
        let store = Arc::new(MessageStore::new(viewer.id));
        let ledger = Arc::new(RequestLedger::new(store.clone()));
        let fetcher = ConversationFetcher::new(backend.clone(), viewer.id);
        let sync = SyncLoop::new(
            fetcher.clone(),
            ledger.clone(),
            listener.clone(),
            poll_interval,
        );
        let sender = SendCoordinator::new(backend.clone(), fetcher, ledger, listener);
        Ok(Self {
            viewer,
            backend,
            unread: UnreadTracker::new(store.clone()),
            store,
            sync,
            sender,
            active: Mutex::new(None),
            send_lock: TokioMutex::new(()),
        })
    }

    pub fn viewer(&self) -> &User {
        &self.viewer
    }

    pub fn active_peer(&self) -> Option<Identity> {
        self.active.lock().as_ref().map(|v| v.peer())
    }

    pub fn sync_status(&self) -> Option<SyncStatus> {
        self.active.lock().as_ref().map(|v| v.status())
    }

    /// Switches the active conversation to `peer` and waits for its first
    /// fetch. Selecting again restarts a halted loop.
    ///
    /// Returns the authentication error if the first fetch was rejected;
    /// other first-fetch failures are logged and polling continues. Unless
    /// authentication failed, the conversation is then marked read in the
    /// background, whether or not the first fetch succeeded.
    pub async fn select_peer(&self, peer: Identity) -> Result<(), ChatError> {
        let handle = {
            let mut active = self.active.lock();
            if let Some(previous) = active.take() {
                previous.cancel();
            }
            let handle = self.sync.start(peer);
            *active = Some(handle.clone());
            handle
        };
        handle.synced().await?;
        if handle.is_cancelled() {
            return Ok(());
        }
        let backend = self.backend.clone();
        tokio::spawn(async move {
            if let Err(err) = backend.mark_conversation_read(peer).await {
                tracing::warn!(%peer, ?err, "Failed to mark conversation as read");
            }
        });
        Ok(())
    }

    /// Stops polling the active conversation, if any.
    pub fn leave_conversation(&self) {
        if let Some(handle) = self.active.lock().take() {
            handle.cancel();
        }
    }

    /// Sends to the active peer. Calls are serialized so messages reach the
    /// backend in call order. The caller keeps `content` on failure.
    pub async fn send_to_active(&self, content: &str) -> Result<Message, ChatError> {
        let peer = self
            .active_peer()
            .ok_or(ChatError::NoActiveConversation)?;
        self.send(peer, content).await
    }

    pub async fn send(&self, receiver: Identity, content: &str) -> Result<Message, ChatError> {
        let _guard = self.send_lock.lock().await;
        self.sender.send(receiver, content).await
    }

    pub fn messages_for(&self, peer: Identity) -> Vec<Message> {
        self.store.get(peer)
    }

    pub fn unread_count(&self, peer: Identity) -> usize {
        self.unread.unread_count(peer)
    }

    /// Users of the counterpart role (students for a tutor, tutors otherwise)
    /// with their unread counts.
    pub async fn load_peers(&self) -> Result<Vec<PeerSummary>, ChatError> {
        let users = self
            .backend
            .list_users(self.viewer.role.counterpart())
            .await?;
        let peers = users
            .into_iter()
            .filter(|user| user.id != self.viewer.id)
            .map(|user| PeerSummary {
                unread: self.unread.unread_count(user.id),
                user,
            })
            .collect();
        Ok(peers)
    }

    /// Stops polling and forgets every stored conversation.
    pub fn sign_out(&self) {
        self.leave_conversation();
        self.store.clear();
        tracing::info!(viewer = %self.viewer.id, "Signed out of conversations");
    }
}

impl Drop for ChatManager {
    fn drop(&mut self) {
        self.leave_conversation();
    }
}
