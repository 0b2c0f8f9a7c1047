//! Upstream dependency client.

pub mod client;

pub use client::{ClientError, UpstreamClient, UpstreamError};
