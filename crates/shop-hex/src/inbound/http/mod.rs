pub mod auth;
mod server;

pub use server::{HttpServer, HttpServerConfig};
