use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use tutorlink_transport::{
    ErrorPayload, MessagePayload, Role, SendMessageRequest, StatusPayload, UserPayload,
};

use crate::auth::Caller;
use crate::server::ServerState;

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorPayload {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

pub(crate) async fn send_message(
    State(state): State<Arc<ServerState>>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessagePayload>), ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Failed to send message: Content is required",
        ));
    }
    let mut directory = state.directory.write().await;
    if directory.user(req.receiver_id).is_none() {
        return Err(ApiError::bad_request(format!(
            "Failed to send message: Receiver not found with id: {}",
            req.receiver_id
        )));
    }
    let message = directory.add_message(caller.id, req.receiver_id, req.content);
    tracing::debug!(
        message_id = message.id,
        sender_id = caller.id,
        receiver_id = message.receiver_id,
        "Message stored"
    );
    Ok((StatusCode::CREATED, Json(directory.message_payload(&message))))
}

pub(crate) async fn get_conversation(
    State(state): State<Arc<ServerState>>,
    Extension(caller): Extension<Caller>,
    Path(other_user_id): Path<i64>,
) -> Json<Vec<MessagePayload>> {
    let directory = state.directory.read().await;
    let messages = directory
        .conversation(caller.id, other_user_id)
        .iter()
        .map(|m| directory.message_payload(m))
        .collect();
    Json(messages)
}

pub(crate) async fn unread_messages(
    State(state): State<Arc<ServerState>>,
    Extension(caller): Extension<Caller>,
) -> Json<Vec<MessagePayload>> {
    let directory = state.directory.read().await;
    let messages = directory
        .unread_messages(caller.id)
        .iter()
        .map(|m| directory.message_payload(m))
        .collect();
    Json(messages)
}

pub(crate) async fn all_messages(
    State(state): State<Arc<ServerState>>,
    Extension(caller): Extension<Caller>,
) -> Json<Vec<MessagePayload>> {
    let directory = state.directory.read().await;
    let messages = directory
        .all_messages(caller.id)
        .iter()
        .map(|m| directory.message_payload(m))
        .collect();
    Json(messages)
}

pub(crate) async fn mark_conversation_read(
    State(state): State<Arc<ServerState>>,
    Extension(caller): Extension<Caller>,
    Path(other_user_id): Path<i64>,
) -> Json<StatusPayload> {
    let changed = state
        .directory
        .write()
        .await
        .mark_conversation_read(caller.id, other_user_id);
    tracing::debug!(reader = caller.id, other_user_id, changed, "Conversation marked as read");
    Json(StatusPayload {
        message: "Conversation marked as read".into(),
    })
}

pub(crate) async fn current_user(
    State(state): State<Arc<ServerState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<UserPayload>, ApiError> {
    let directory = state.directory.read().await;
    let user = directory
        .user(caller.id)
        .ok_or_else(|| ApiError::unauthorized("User not authenticated"))?;
    Ok(Json(user.payload()))
}

pub(crate) async fn users_by_role(
    State(state): State<Arc<ServerState>>,
    Path(role): Path<String>,
) -> Result<Json<Vec<UserPayload>>, ApiError> {
    let role = Role::from_str(&role).map_err(ApiError::bad_request)?;
    let directory = state.directory.read().await;
    let users = directory
        .users_by_role(role)
        .iter()
        .map(|v| v.payload())
        .collect();
    Ok(Json(users))
}
