use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::routes::ApiError;
use crate::server::ServerState;

/// Authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Caller {
    pub id: i64,
}

pub(crate) async fn require_auth(
    State(state): State<Arc<ServerState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("User not authenticated"))?;
    let caller = {
        let directory = state.directory.read().await;
        let user = directory
            .user_by_token(token)
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;
        Caller { id: user.id }
    };
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
