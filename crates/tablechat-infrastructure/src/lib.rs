//! TableChat infrastructure layer: durable storage implementations.

pub mod token_storage;

pub use token_storage::FileTokenStorage;
