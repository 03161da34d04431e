use serde::{Deserialize, Serialize};
use tutorlink_transport::MessagePayload;

use super::{ConversationKey, DateTime, Identity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    // Server-assigned, immutable.
    pub id: i64,
    pub sender_id: Identity,
    pub receiver_id: Identity,
    pub content: String,
    pub created_at: DateTime,
    // Flipped server-side when the receiver reads the conversation.
    pub is_read: bool,
}

impl Message {
    pub fn conversation(&self) -> ConversationKey {
        ConversationKey::new(self.sender_id, self.receiver_id)
    }

    /// Whether the message is waiting to be read by `viewer`.
    pub fn is_unread_by(&self, viewer: Identity) -> bool {
        self.receiver_id == viewer && !self.is_read
    }
}

impl From<MessagePayload> for Message {
    fn from(payload: MessagePayload) -> Self {
        Self {
            id: payload.id,
            sender_id: Identity(payload.sender_id),
            receiver_id: Identity(payload.receiver_id),
            content: payload.content,
            created_at: DateTime(payload.created_at),
            is_read: payload.is_read,
        }
    }
}
