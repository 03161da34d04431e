use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tutorlink_transport::{MessagePayload, Role, UserPayload};

#[derive(Clone, Debug)]
pub(crate) struct UserRecord {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

impl UserRecord {
    pub fn payload(&self) -> UserPayload {
        UserPayload {
            id: self.id,
            full_name: Some(self.full_name.clone()),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct MessageRecord {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// In-memory users, bearer tokens and messages.
#[derive(Default)]
pub(crate) struct Directory {
    users: HashMap<i64, UserRecord>,
    tokens: HashMap<String, i64>,
    messages: Vec<MessageRecord>,
    last_user_id: i64,
    last_message_id: i64,
}

impl Directory {
    pub fn add_user(
        &mut self,
        full_name: String,
        email: String,
        role: Role,
        token: String,
    ) -> UserRecord {
        self.last_user_id += 1;
        let user = UserRecord {
            id: self.last_user_id,
            full_name,
            email,
            role,
        };
        self.users.insert(user.id, user.clone());
        self.tokens.insert(token, user.id);
        user
    }

    pub fn user_by_token(&self, token: &str) -> Option<&UserRecord> {
        self.tokens.get(token).and_then(|id| self.users.get(id))
    }

    pub fn user(&self, id: i64) -> Option<&UserRecord> {
        self.users.get(&id)
    }

    pub fn users_by_role(&self, role: Role) -> Vec<UserRecord> {
        let mut users: Vec<_> = self
            .users
            .values()
            .filter(|v| v.role == role)
            .cloned()
            .collect();
        users.sort_by_key(|v| v.id);
        users
    }

    pub fn add_message(&mut self, sender_id: i64, receiver_id: i64, content: String) -> MessageRecord {
        self.last_message_id += 1;
        // Keep timestamps non-decreasing so id order and time order agree.
        let mut created_at = Utc::now();
        if let Some(last) = self.messages.last() {
            created_at = created_at.max(last.created_at);
        }
        let message = MessageRecord {
            id: self.last_message_id,
            sender_id,
            receiver_id,
            content,
            is_read: false,
            created_at,
        };
        self.messages.push(message.clone());
        message
    }

    pub fn conversation(&self, user_a: i64, user_b: i64) -> Vec<MessageRecord> {
        let mut messages: Vec<_> = self
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_a && m.receiver_id == user_b)
                    || (m.sender_id == user_b && m.receiver_id == user_a)
            })
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        messages
    }

    /// Unread messages addressed to `user`, newest first.
    pub fn unread_messages(&self, user: i64) -> Vec<MessageRecord> {
        self.newest_first(|m| m.receiver_id == user && !m.is_read)
    }

    /// Every message `user` sent or received, newest first.
    pub fn all_messages(&self, user: i64) -> Vec<MessageRecord> {
        self.newest_first(|m| m.sender_id == user || m.receiver_id == user)
    }

    fn newest_first(&self, filter: impl Fn(&MessageRecord) -> bool) -> Vec<MessageRecord> {
        let mut messages: Vec<_> = self.messages.iter().filter(|m| filter(m)).cloned().collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        messages
    }

    /// Marks every message `reader` received from `other` as read and
    /// returns how many changed.
    pub fn mark_conversation_read(&mut self, reader: i64, other: i64) -> usize {
        let mut changed = 0;
        for message in self.messages.iter_mut() {
            if message.receiver_id == reader && message.sender_id == other && !message.is_read {
                message.is_read = true;
                changed += 1;
            }
        }
        changed
    }

    pub fn message_payload(&self, message: &MessageRecord) -> MessagePayload {
        MessagePayload {
            id: message.id,
            sender_id: message.sender_id,
            sender_name: self.user(message.sender_id).map(|v| v.full_name.clone()),
            receiver_id: message.receiver_id,
            receiver_name: self.user(message.receiver_id).map(|v| v.full_name.clone()),
            content: message.content.clone(),
            is_read: message.is_read,
            created_at: message.created_at,
        }
    }
}
