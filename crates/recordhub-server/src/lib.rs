//! RecordHub HTTP server: configuration, startup wiring and routes.

pub mod bootstrap;
pub mod config;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use server::{RecordHubServer, ServerBuilder, build_app};
