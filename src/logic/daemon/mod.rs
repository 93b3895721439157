//! Daemon Transport Layer
//!
//! Wire types and the JSON-over-HTTP client for the scanning daemon,
//! behind the [`client::DaemonApi`] seam.

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;
