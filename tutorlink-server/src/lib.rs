mod auth;
mod directory;
mod routes;
mod server;

pub use server::*;
