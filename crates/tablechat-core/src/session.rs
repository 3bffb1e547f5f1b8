//! Session token model.
//!
//! The backend correlates conversation turns through one opaque token. The
//! token is created locally on first use and may be replaced by the server
//! in any turn; the latest value always wins and is persisted immediately.
//! Durability is delegated to a [`TokenStorage`] implementation (see
//! `tablechat-infrastructure`).

use std::sync::Arc;

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::Result;

/// Persistence seam for the single session token.
pub trait TokenStorage: Send + Sync {
    /// Loads the persisted token, if any.
    fn load(&self) -> Result<Option<String>>;
    /// Persists the token, replacing any previous value.
    fn save(&self, token: &str) -> Result<()>;
}

/// Owns the in-memory token and keeps it in sync with storage.
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    current: String,
}

impl SessionStore {
    /// Loads the persisted token, generating and persisting a fresh one if
    /// none exists.
    pub fn open(storage: Arc<dyn TokenStorage>) -> Result<Self> {
        let current = match storage.load()? {
            Some(token) if !token.trim().is_empty() => token,
            _ => {
                let token = generate_token();
                storage.save(&token)?;
                token
            }
        };

        Ok(Self { storage, current })
    }

    /// The currently active token.
    pub fn token(&self) -> &str {
        &self.current
    }

    /// Adopts a server-supplied token.
    ///
    /// A missing, empty, or identical value is a no-op; a differing value
    /// replaces the in-memory token and is persisted before returning.
    pub fn adopt(&mut self, new_token: Option<&str>) -> Result<bool> {
        let Some(new_token) = new_token else {
            return Ok(false);
        };
        if new_token.is_empty() || new_token == self.current {
            return Ok(false);
        }

        self.storage.save(new_token)?;
        self.current = new_token.to_string();
        Ok(true)
    }
}

/// Generates a fresh session token.
///
/// Format: `sess_` + random alphanumeric component + base36 time component.
/// Collision avoidance only; this is not a credential.
pub fn generate_token() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u128;

    format!("sess_{}{}", random, to_base36(millis))
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}
