//! Load Shed API library.

pub mod config;
pub mod http;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::AppConfig;
pub use http::HttpServer;
