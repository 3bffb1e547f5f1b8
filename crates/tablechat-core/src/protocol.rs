//! Wire types for the chat/order backend.
//!
//! One chat request produces one [`ServerTurn`]: reply text, an optional
//! session id update, optional structured menu suggestions, an optional
//! order snapshot, and an optional payment initiation block. Every field
//! is optional on the wire; routing of a turn is the orchestrator's job.

use serde::{Deserialize, Deserializer, Serialize};

/// One complete response to an outbound chat message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerTurn {
    /// Bot reply text to show to the user.
    #[serde(default)]
    pub reply: Option<String>,
    /// Server-assigned session id; adopting it is mandatory when present.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Structured menu suggestions to render as interactive cards.
    #[serde(default)]
    pub menu_items: Vec<MenuSuggestion>,
    /// Authoritative order snapshot; replaces the local cart wholesale.
    #[serde(default)]
    pub order: Option<OrderSnapshot>,
    /// Payment initiation parameters for the external checkout.
    #[serde(default)]
    pub payment: Option<PaymentBlock>,
}

/// A single server-supplied menu suggestion.
///
/// The backend renders prices from a Decimal column, so `price` may arrive
/// as a JSON number or a numeric string; both parse, and an empty string
/// counts as absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MenuSuggestion {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt_number")]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

/// The server-authoritative order mirror.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderSnapshot {
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: f64,
}

impl OrderSnapshot {
    /// True when the order carries no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One line item inside an order snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_price: f64,
}

/// Payment initiation parameters supplied by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentBlock {
    pub key: String,
    #[serde(deserialize_with = "lenient_number")]
    pub amount: f64,
    pub currency: String,
    pub order_id: String,
}

/// Correlation fields issued by the gateway on a completed checkout,
/// posted back verbatim for verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayReceipt {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

/// Result of the backend payment verification call.
///
/// `Error` (the verification call itself failed) is deliberately distinct
/// from `Failed` (the backend confirmed the payment did not go through).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Success,
    Failed,
    Error,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Num(f64),
    Str(String),
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Num(n) => Ok(n),
        NumberOrString::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Num(n)) => Ok(Some(n)),
        Some(NumberOrString::Str(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed.parse().map(Some).map_err(serde::de::Error::custom)
            }
        }
    }
}
