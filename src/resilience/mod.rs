//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → admission.rs (reserve a concurrency slot, or shed immediately)
//!     → circuit_breaker.rs (allow the upstream attempt, or fail fast)
//!     → bounded upstream call (upstream::client)
//!     → outcome.rs (classify the attempt)
//!     → circuit_breaker.rs (feed the outcome back as evidence)
//! ```
//!
//! # Design Decisions
//! - Shedding is immediate; there is no queue above the concurrency ceiling
//! - Shed and breaker-open responses are protective, not failures to retry
//! - The breaker lock is never held across the upstream call
//! - Slot release is a Drop guard so no exit path can leak a slot

pub mod admission;
pub mod circuit_breaker;
pub mod outcome;

pub use admission::{AdmissionController, AdmissionPermit};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use outcome::Outcome;
