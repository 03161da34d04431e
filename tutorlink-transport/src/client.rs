use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    Error, ErrorPayload, MessagePayload, Role, SendMessageRequest, Session, StatusPayload,
    UserPayload,
};

/// HTTP client for the messaging REST API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    session: Session,
}

impl ApiClient {
    pub fn new(session: Session) -> Self {
        Self::with_client(reqwest::Client::new(), session)
    }

    pub fn with_client(http: reqwest::Client, session: Session) -> Self {
        Self { http, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Full thread between the caller and `other_user_id`, oldest first.
    pub async fn get_conversation(&self, other_user_id: i64) -> Result<Vec<MessagePayload>, Error> {
        let path = format!("/api/messages/conversation/{other_user_id}");
        self.execute(self.request(Method::GET, &path)?).await
    }

    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<MessagePayload, Error> {
        let builder = self.request(Method::POST, "/api/messages/send")?;
        self.execute(builder.json(request)).await
    }

    /// Unread messages addressed to the caller, newest first.
    pub async fn unread_messages(&self) -> Result<Vec<MessagePayload>, Error> {
        self.execute(self.request(Method::GET, "/api/messages/unread")?)
            .await
    }

    /// Every message the caller sent or received, newest first.
    pub async fn all_messages(&self) -> Result<Vec<MessagePayload>, Error> {
        self.execute(self.request(Method::GET, "/api/messages/all")?)
            .await
    }

    pub async fn mark_conversation_read(&self, other_user_id: i64) -> Result<(), Error> {
        let path = format!("/api/messages/mark-read/{other_user_id}");
        let status: StatusPayload = self.execute(self.request(Method::POST, &path)?).await?;
        tracing::trace!(other_user_id, message = %status.message, "Conversation marked as read");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<UserPayload, Error> {
        self.execute(self.request(Method::GET, "/api/users/me")?)
            .await
    }

    pub async fn users_by_role(&self, role: Role) -> Result<Vec<UserPayload>, Error> {
        let path = format!("/api/users/role/{}", role.as_str());
        self.execute(self.request(Method::GET, &path)?).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, Error> {
        let token = self
            .session
            .token()
            .ok_or_else(|| Error::Unauthorized("session has no token".into()))?;
        Ok(self
            .http
            .request(method, self.session.url(path))
            .bearer_auth(token))
    }

    async fn execute<T>(&self, builder: RequestBuilder) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorPayload>(&body)
                .map(|v| v.error)
                .unwrap_or_else(|_| body.clone());
            tracing::debug!(%status, %message, "Request rejected");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(message),
                _ => Error::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }
        serde_json::from_str(&body).map_err(|err| Error::Decode(err.to_string()))
    }
}

