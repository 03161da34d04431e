use std::sync::Arc;

use crate::ChatError;
use crate::backend::Backend;
use crate::models::{ConversationKey, Identity, Message};

/// Pulls the authoritative thread between the viewer and one peer.
#[derive(Clone)]
pub struct ConversationFetcher {
    backend: Arc<dyn Backend>,
    viewer: Identity,
}

impl ConversationFetcher {
    pub fn new(backend: Arc<dyn Backend>, viewer: Identity) -> Self {
        Self { backend, viewer }
    }

    /// Full thread ordered by `created_at`, ties by `id`. Errors are returned
    /// as-is, never retried here.
    pub async fn fetch(&self, peer: Identity) -> Result<Vec<Message>, ChatError> {
        let mut messages = self.backend.fetch_conversation(peer).await?;
        let key = ConversationKey::new(self.viewer, peer);
        if let Some(message) = messages.iter().find(|m| m.conversation() != key) {
            return Err(ChatError::Protocol(format!(
                "message {} is not part of the conversation with {}",
                message.id, peer
            )));
        }
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        tracing::trace!(%peer, count = messages.len(), "Fetched conversation");
        Ok(messages)
    }
}
