use std::time::Duration;

use anyhow::{Context as _, anyhow};
use tutorlink_transport::Session;

use crate::DEFAULT_API_URL;
use crate::chat::SyncLoop;

/// Client settings read from the environment.
/// Keys used:
/// - `TUTORLINK_API_URL`: backend base URL, defaults to [`DEFAULT_API_URL`]
/// - `TUTORLINK_TOKEN`: bearer token of the logged-in user (required)
/// - `TUTORLINK_POLL_INTERVAL_MS`: conversation poll interval, defaults to 3000
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: String,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub const API_URL_VAR: &str = "TUTORLINK_API_URL";
    pub const TOKEN_VAR: &str = "TUTORLINK_TOKEN";
    pub const POLL_INTERVAL_VAR: &str = "TUTORLINK_POLL_INTERVAL_MS";

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(Self::API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token = lookup(Self::TOKEN_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(anyhow!("{} is not set", Self::TOKEN_VAR))?;
        let poll_interval = match lookup(Self::POLL_INTERVAL_VAR) {
            Some(raw) => {
                let millis: u64 = raw.trim().parse().with_context(|| {
                    format!("Failed to parse {} '{}'", Self::POLL_INTERVAL_VAR, raw)
                })?;
                if millis == 0 {
                    return Err(anyhow!("{} must be positive", Self::POLL_INTERVAL_VAR));
                }
                Duration::from_millis(millis)
            }
            None => SyncLoop::DEFAULT_INTERVAL,
        };
        Ok(Self {
            api_url,
            token,
            poll_interval,
        })
    }

    /// Session logged in with the configured token.
    pub fn session(&self) -> Session {
        Session::with_token(&self.api_url, &self.token)
    }
}
