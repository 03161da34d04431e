mod message;
mod types;
mod user;

pub use message::*;
pub use types::*;
pub use user::*;
