use async_trait::async_trait;
use tutorlink_transport::{ApiClient, SendMessageRequest, Session};

use crate::ChatError;
use crate::models::{Identity, Message, Role, User};

use super::Backend;

/// `Backend` over the REST API.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: ApiClient,
}

impl HttpBackend {
    pub fn new(session: Session) -> Self {
        Self {
            client: ApiClient::new(session),
        }
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_conversation(&self, peer: Identity) -> Result<Vec<Message>, ChatError> {
        let messages = self.client.get_conversation(peer.0).await?;
        Ok(messages.into_iter().map(Message::from).collect())
    }

    async fn send_message(&self, receiver: Identity, content: &str) -> Result<Message, ChatError> {
        let request = SendMessageRequest {
            receiver_id: receiver.0,
            content: content.to_string(),
        };
        Ok(self.client.send_message(&request).await?.into())
    }

    async fn mark_conversation_read(&self, peer: Identity) -> Result<(), ChatError> {
        Ok(self.client.mark_conversation_read(peer.0).await?)
    }

    async fn resolve_viewer(&self) -> Result<User, ChatError> {
        Ok(self.client.current_user().await?.into())
    }

    async fn list_users(&self, role: Role) -> Result<Vec<User>, ChatError> {
        let users = self.client.users_by_role(role).await?;
        Ok(users.into_iter().map(User::from).collect())
    }
}
