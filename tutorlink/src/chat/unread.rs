use std::sync::Arc;

use crate::models::Identity;

use super::MessageStore;

/// Per-peer unread counts derived from the store.
///
/// A peer whose conversation was never fetched counts 0, even when the
/// backend holds unread messages from them.
#[derive(Clone)]
pub struct UnreadTracker {
    store: Arc<MessageStore>,
}

impl UnreadTracker {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }

    pub fn unread_count(&self, peer: Identity) -> usize {
        let viewer = self.store.viewer();
        self.store.read(peer, |messages| {
            messages.iter().filter(|m| m.is_unread_by(viewer)).count()
        })
    }

    pub fn unread_counts(&self, peers: &[Identity]) -> Vec<(Identity, usize)> {
        peers
            .iter()
            .map(|peer| (*peer, self.unread_count(*peer)))
            .collect()
    }
}
