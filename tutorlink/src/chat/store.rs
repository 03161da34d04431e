use std::collections::HashMap;

use parking_lot::Mutex;

use crate::models::{ConversationKey, Identity, Message};

/// Latest fetched thread of every conversation the viewer takes part in.
///
/// Only the sync loop and the send coordinator replace entries; everything
/// else reads.
pub struct MessageStore {
    viewer: Identity,
    conversations: Mutex<HashMap<ConversationKey, Vec<Message>>>,
}

impl MessageStore {
    pub fn new(viewer: Identity) -> Self {
        Self {
            viewer,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    pub fn viewer(&self) -> Identity {
        self.viewer
    }

    /// Overwrites the thread with `peer`.
    ///
    /// Panics if a message does not belong to the conversation between the
    /// viewer and `peer`.
    pub(crate) fn replace(&self, peer: Identity, messages: Vec<Message>) {
        let key = ConversationKey::new(self.viewer, peer);
        for message in messages.iter() {
            assert_eq!(
                message.conversation(),
                key,
                "message {} does not belong to the conversation with {}",
                message.id,
                peer,
            );
        }
        tracing::trace!(%peer, count = messages.len(), "Replace conversation");
        self.conversations.lock().insert(key, messages);
    }

    /// Stored thread with `peer`, empty if it was never fetched.
    pub fn get(&self, peer: Identity) -> Vec<Message> {
        self.read(peer, |messages| messages.to_vec())
    }

    pub fn contains(&self, peer: Identity) -> bool {
        let key = ConversationKey::new(self.viewer, peer);
        self.conversations.lock().contains_key(&key)
    }

    pub(crate) fn read<R>(&self, peer: Identity, f: impl FnOnce(&[Message]) -> R) -> R {
        let key = ConversationKey::new(self.viewer, peer);
        let conversations = self.conversations.lock();
        match conversations.get(&key) {
            Some(messages) => f(messages),
            None => f(&[]),
        }
    }

    pub(crate) fn clear(&self) {
        self.conversations.lock().clear();
    }
}
