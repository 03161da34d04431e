mod fetcher;
mod listener;
mod manager;
mod sender;
mod store;
mod sync;
mod unread;

pub use fetcher::*;
pub use listener::*;
pub use manager::*;
pub use sender::*;
pub use store::*;
pub use sync::*;
pub use unread::*;
