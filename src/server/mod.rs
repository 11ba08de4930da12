//! HTTP server, background collector and process wiring

pub mod collector;
pub mod http;
pub mod server;

pub use collector::Collector;
pub use server::Server;
