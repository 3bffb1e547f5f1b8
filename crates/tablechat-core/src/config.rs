//! Client configuration.
//!
//! The embedding host supplies a restaurant identifier and an API base URL.
//! The restaurant id is transmitted as a number; a non-numeric value is a
//! host configuration defect and is rejected here, at construction, rather
//! than being swallowed at send time.

use crate::error::{ChatClientError, Result};

/// Environment variable carrying the restaurant identifier (required).
pub const ENV_RESTAURANT_ID: &str = "TABLECHAT_RESTAURANT_ID";
/// Environment variable carrying the API base URL (optional).
pub const ENV_API_BASE: &str = "TABLECHAT_API_BASE";

/// Fallback API base when the host does not supply one.
///
/// In-page embeddings can default to same-origin; a standalone client has
/// no origin, so the backend's local development address is used instead.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Immutable configuration for one client instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Numeric restaurant identifier, sent with every chat request.
    pub restaurant_id: i64,
    /// API base URL with any trailing slash stripped.
    pub api_base: String,
}

impl ClientConfig {
    /// Creates a configuration from an already-numeric restaurant id.
    pub fn new(restaurant_id: i64, api_base: impl Into<String>) -> Self {
        Self {
            restaurant_id,
            api_base: normalize_base(api_base.into()),
        }
    }

    /// Parses host-supplied attribute strings.
    ///
    /// A missing or non-numeric restaurant id is fatal: no client is built.
    pub fn parse(restaurant_id: &str, api_base: Option<&str>) -> Result<Self> {
        let trimmed = restaurant_id.trim();
        if trimmed.is_empty() {
            return Err(ChatClientError::config("restaurant id is required"));
        }

        let restaurant_id: i64 = trimmed.parse().map_err(|_| {
            ChatClientError::config(format!("restaurant id is not numeric: '{trimmed}'"))
        })?;

        let api_base = api_base
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_API_BASE);

        Ok(Self::new(restaurant_id, api_base))
    }

    /// Reads the configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let restaurant_id = std::env::var(ENV_RESTAURANT_ID).map_err(|_| {
            ChatClientError::config(format!("{ENV_RESTAURANT_ID} is required"))
        })?;
        let api_base = std::env::var(ENV_API_BASE).ok();
        Self::parse(&restaurant_id, api_base.as_deref())
    }
}

fn normalize_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}
