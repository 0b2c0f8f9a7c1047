//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment variable overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared with all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the service runs with no config at all
//! - Validation runs once, after every override layer has been applied

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AdmissionConfig, AppConfig, BreakerConfig, ListenerConfig, ObservabilityConfig,
    UpstreamConfig, WorkConfig,
};
