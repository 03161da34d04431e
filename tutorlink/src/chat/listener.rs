use async_trait::async_trait;

use crate::ChatError;
use crate::models::{Identity, Message};

#[async_trait]
pub trait ChatListener: Send + Sync {
    /// A fetch replaced the stored thread with `peer`.
    async fn on_conversation_updated(&self, peer: Identity, messages: Vec<Message>);

    /// Polling of `peer` stopped on an authentication failure.
    async fn on_sync_halted(&self, peer: Identity, error: ChatError);
}

pub(super) struct StubListener;

#[async_trait]
impl ChatListener for StubListener {
    async fn on_conversation_updated(&self, peer: Identity, messages: Vec<Message>) {
        _ = peer;
        _ = messages;
    }

    async fn on_sync_halted(&self, peer: Identity, error: ChatError) {
        _ = peer;
        _ = error;
    }
}
