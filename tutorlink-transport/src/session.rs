use std::sync::{Arc, RwLock};

/// Authentication context shared by every request made on behalf of the
/// logged-in user.
///
/// A session is created with the backend base URL, receives its bearer token
/// at login and drops it at logout. Clones share the same state, so logging
/// out through one clone affects every client built on it.
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(SessionInner {
                base_url,
                token: RwLock::new(None),
            }),
        }
    }

    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let session = Self::new(base_url);
        session.login(token);
        session
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn login(&self, token: impl Into<String>) {
        let token = token.into();
        tracing::debug!(base_url = %self.inner.base_url, "Session token installed");
        *self.inner.token.write().unwrap() = Some(token);
    }

    pub fn logout(&self) {
        tracing::debug!(base_url = %self.inner.base_url, "Session token cleared");
        self.inner.token.write().unwrap().take();
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.read().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.token.read().unwrap().is_some()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }
}

#[derive(Debug)]
struct SessionInner {
    base_url: String,
    token: RwLock<Option<String>>,
}
