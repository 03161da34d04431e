use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tutorlink_transport::{Role, UserPayload};

use crate::auth::require_auth;
use crate::directory::Directory;
use crate::routes;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub(crate) struct ServerState {
    pub directory: RwLock<Directory>,
}

/// In-memory messaging backend speaking the tutoring platform REST API.
pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl Server {
    /// Create and bind a new messaging server
    pub async fn new(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = ?listener.local_addr()?, "Server started listening");
        Ok(Self {
            listener,
            state: Arc::new(ServerState {
                directory: RwLock::new(Directory::default()),
            }),
        })
    }

    /// Get the server's socket address
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Base URL clients should use to reach this server
    pub fn base_url(&self) -> Result<String, Error> {
        Ok(format!("http://{}", self.local_addr()?))
    }

    /// Register an account that authenticates with `token`.
    pub async fn register_user(
        &self,
        full_name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        token: impl Into<String>,
    ) -> UserPayload {
        let mut directory = self.state.directory.write().await;
        let user = directory.add_user(full_name.into(), email.into(), role, token.into());
        tracing::debug!(user_id = user.id, role = %user.role, "User registered");
        user.payload()
    }

    /// Run the server
    pub async fn run(self) -> Result<(), Error> {
        let app = Self::router(self.state);
        axum::serve(self.listener, app).await?;
        Ok(())
    }

    fn router(state: Arc<ServerState>) -> Router {
        Router::new()
            .route("/api/messages/send", post(routes::send_message))
            .route(
                "/api/messages/conversation/{other_user_id}",
                get(routes::get_conversation),
            )
            .route("/api/messages/unread", get(routes::unread_messages))
            .route("/api/messages/all", get(routes::all_messages))
            .route(
                "/api/messages/mark-read/{other_user_id}",
                post(routes::mark_conversation_read),
            )
            .route("/api/users/me", get(routes::current_user))
            .route("/api/users/role/{role}", get(routes::users_by_role))
            .layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
