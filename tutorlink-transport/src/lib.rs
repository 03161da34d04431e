mod client;
mod error;
mod payload;
mod session;

pub use client::*;
pub use error::*;
pub use payload::*;
pub use session::*;
