//! TableChat domain layer.
//!
//! Everything here is pure client-side state and rules: the session token,
//! the server-authoritative cart mirror and its reconciliation decision
//! table, the append-only conversation log, the payment attempt state
//! machine, and the canonical command texts. Network and persistence live
//! in the sibling crates.

pub mod cart;
pub mod catalog;
pub mod command;
pub mod config;
pub mod conversation;
pub mod error;
pub mod payment;
pub mod protocol;
pub mod session;

// Re-export common error type
pub use error::{ChatClientError, Result};
