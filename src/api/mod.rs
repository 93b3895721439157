//! API Module
//!
//! Command surface exposed to the embedding shell. Every user action
//! goes through [`commands::CommandDispatcher`]; results come back via
//! the store, never as return values.

pub mod commands;

pub use commands::*;
