mod http;

pub use http::*;

use async_trait::async_trait;

use crate::ChatError;
use crate::models::{Identity, Message, Role, User};

/// Messaging backend as seen by the viewer's client. Every call is made on
/// behalf of the logged-in viewer.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Full thread between the viewer and `peer`, oldest first.
    async fn fetch_conversation(&self, peer: Identity) -> Result<Vec<Message>, ChatError>;

    /// Creates one message and returns its server-assigned representation.
    async fn send_message(&self, receiver: Identity, content: &str) -> Result<Message, ChatError>;

    /// Marks everything the viewer received from `peer` as read.
    async fn mark_conversation_read(&self, peer: Identity) -> Result<(), ChatError>;

    async fn resolve_viewer(&self) -> Result<User, ChatError>;

    async fn list_users(&self, role: Role) -> Result<Vec<User>, ChatError>;
}
