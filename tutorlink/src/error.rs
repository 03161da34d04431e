use thiserror::Error;

use crate::models::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Transport or connectivity failure. Poll ticks absorb it; sends surface it.
    #[error("network error: {0}")]
    Network(String),
    /// Expired or invalid credentials. Halts polling and must reach the user.
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("cannot send a message to {0}")]
    InvalidRecipient(Identity),
    #[error("message content is empty")]
    EmptyContent,
    /// The backend answered with something that breaks the conversation contract.
    #[error("unexpected response: {0}")]
    Protocol(String),
    #[error("no conversation is active")]
    NoActiveConversation,
}

impl ChatError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<tutorlink_transport::Error> for ChatError {
    fn from(err: tutorlink_transport::Error) -> Self {
        use tutorlink_transport::Error;
        match err {
            Error::Unauthorized(message) => Self::Auth(message),
            Error::Decode(message) => Self::Protocol(message),
            err @ (Error::Request(_) | Error::Status { .. }) => Self::Network(err.to_string()),
        }
    }
}
