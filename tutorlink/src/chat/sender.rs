use std::sync::Arc;

use crate::ChatError;
use crate::backend::Backend;
use crate::models::{Identity, Message};

use super::{ChatListener, ConversationFetcher, RequestLedger};

/// Sends a message and resynchronizes the affected conversation.
pub struct SendCoordinator {
    backend: Arc<dyn Backend>,
    fetcher: ConversationFetcher,
    ledger: Arc<RequestLedger>,
    listener: Arc<dyn ChatListener>,
}

impl SendCoordinator {
    pub fn new(
        backend: Arc<dyn Backend>,
        fetcher: ConversationFetcher,
        ledger: Arc<RequestLedger>,
        listener: Arc<dyn ChatListener>,
    ) -> Self {
        Self {
            backend,
            fetcher,
            ledger,
            listener,
        }
    }

    /// Submits trimmed `content` to `receiver`, then refetches the thread so
    /// the store holds the server-assigned id and timestamp.
    ///
    /// The store is untouched when the backend rejects the message. Sends to
    /// the same receiver are not ordered against each other.
    pub async fn send(&self, receiver: Identity, content: &str) -> Result<Message, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyContent);
        }
        if receiver == self.ledger.store().viewer() {
            return Err(ChatError::InvalidRecipient(receiver));
        }
        let message = match self.backend.send_message(receiver, content).await {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(%receiver, ?err, "Failed to send message");
                return Err(err);
            }
        };
        tracing::debug!(%receiver, message_id = message.id, "Message sent");
        self.resync(receiver).await;
        Ok(message)
    }

    async fn resync(&self, peer: Identity) {
        let tag = self.ledger.issue(peer);
        match self.fetcher.fetch(peer).await {
            Ok(messages) => {
                if self.ledger.apply(tag, messages.clone()) {
                    self.listener.on_conversation_updated(peer, messages).await;
                }
            }
            Err(err) => {
                // The next poll tick catches up.
                tracing::warn!(%peer, ?err, "Failed to refresh conversation after send");
            }
        }
    }
}
