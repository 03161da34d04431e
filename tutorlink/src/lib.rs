pub mod backend;
pub mod chat;
pub mod models;

// Client settings (backend URL, token, poll interval) read from the environment
pub mod config;

mod error;

pub use error::ChatError;

pub const DEFAULT_API_URL: &str = "http://localhost:8081";
