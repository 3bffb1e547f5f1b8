//! Error types for the TableChat client.

use thiserror::Error;

/// A shared error type for the whole client.
///
/// Network-facing failures are split into `Transport` (unreachable host,
/// non-2xx status) and `Protocol` (a reply arrived but could not be parsed)
/// so callers can keep the gateway-confirmed and infrastructure failure
/// paths apart.
#[derive(Error, Debug, Clone)]
pub enum ChatClientError {
    /// Network unreachable or a non-2xx HTTP status.
    #[error("Transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The server replied, but the body was not the expected JSON.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Invalid or missing client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session token storage failure.
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Payment gateway collaborator failure.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatClientError {
    /// Creates a Transport error without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a Transport error carrying the HTTP status.
    pub fn transport_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a Protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a Gateway error.
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Transport error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a Protocol error.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Check if this is a Config error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for ChatClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ChatClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol {
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ChatClientError>`.
pub type Result<T> = std::result::Result<T, ChatClientError>;
