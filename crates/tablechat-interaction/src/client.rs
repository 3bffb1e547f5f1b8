//! HTTP client for the chat/order backend.
//!
//! Three endpoints: the chat turn itself, the one-shot category/popular
//! lookups, and payment verification. Error mapping happens here, at the
//! boundary: connection problems and non-2xx statuses become `Transport`,
//! an unparsable body becomes `Protocol`, and the verification call folds
//! its own failures into [`VerificationOutcome::Error`] so callers never
//! confuse "could not verify" with "gateway said no".

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use tablechat_core::config::ClientConfig;
use tablechat_core::error::{ChatClientError, Result};
use tablechat_core::protocol::{GatewayReceipt, MenuSuggestion, ServerTurn, VerificationOutcome};

const CHAT_PATH: &str = "/api/chatbot/simple/";
const CATEGORIES_PATH: &str = "/api/chatbot/categories/";
const POPULAR_ITEMS_PATH: &str = "/api/chatbot/popular-items/";
const VERIFY_PATH: &str = "/api/payments/verify/";

/// Transport seam for the chat/order backend.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Posts one chat message and returns the server's turn.
    async fn send_message(&self, session_id: &str, message: &str) -> Result<ServerTurn>;

    /// Fetches the browsable category labels.
    async fn fetch_categories(&self) -> Result<Vec<String>>;

    /// Fetches popular menu items for the initial suggestion block.
    async fn fetch_popular_items(&self) -> Result<Vec<MenuSuggestion>>;

    /// Verifies a completed checkout with the backend.
    ///
    /// Infallible by design: transport and parse failures are folded into
    /// [`VerificationOutcome::Error`].
    async fn verify_payment(&self, receipt: &GatewayReceipt) -> VerificationOutcome;
}

/// [`ChatApi`] implementation that talks to the backend over HTTP.
#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    config: ClientConfig,
}

impl HttpChatClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base, path)
    }

    /// Sends one request and returns the raw body of a 2xx response.
    async fn request_body(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(|err| {
            ChatClientError::transport(format!("request failed: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(ChatClientError::transport_status(
                status.as_u16(),
                truncate(&body, 200),
            ));
        }

        response
            .text()
            .await
            .map_err(|err| ChatClientError::transport(format!("failed to read body: {err}")))
    }
}

#[async_trait]
impl ChatApi for HttpChatClient {
    async fn send_message(&self, session_id: &str, message: &str) -> Result<ServerTurn> {
        let request = ChatRequest {
            restaurant_id: self.config.restaurant_id,
            session_id,
            message,
        };

        tracing::debug!(restaurant_id = self.config.restaurant_id, "chat send");

        let body = self
            .request_body(self.client.post(self.endpoint(CHAT_PATH)).json(&request))
            .await?;

        let turn: ServerTurn = serde_json::from_str(&body).map_err(|err| {
            ChatClientError::protocol(format!("malformed chat response: {err}"))
        })?;

        Ok(turn)
    }

    async fn fetch_categories(&self) -> Result<Vec<String>> {
        let body = self
            .request_body(
                self.client
                    .get(self.endpoint(CATEGORIES_PATH))
                    .query(&[("restaurant_id", self.config.restaurant_id)]),
            )
            .await?;

        let parsed: CategoriesResponse = serde_json::from_str(&body).map_err(|err| {
            ChatClientError::protocol(format!("malformed categories response: {err}"))
        })?;

        Ok(parsed.categories)
    }

    async fn fetch_popular_items(&self) -> Result<Vec<MenuSuggestion>> {
        let body = self
            .request_body(
                self.client
                    .get(self.endpoint(POPULAR_ITEMS_PATH))
                    .query(&[("restaurant_id", self.config.restaurant_id)]),
            )
            .await?;

        let parsed: PopularItemsResponse = serde_json::from_str(&body).map_err(|err| {
            ChatClientError::protocol(format!("malformed popular-items response: {err}"))
        })?;

        Ok(parsed.items)
    }

    async fn verify_payment(&self, receipt: &GatewayReceipt) -> VerificationOutcome {
        let result = self
            .request_body(self.client.post(self.endpoint(VERIFY_PATH)).json(receipt))
            .await;

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "payment verification call failed");
                return VerificationOutcome::Error;
            }
        };

        match serde_json::from_str::<VerifyResponse>(&body) {
            Ok(parsed) if parsed.status == "success" => VerificationOutcome::Success,
            Ok(parsed) => {
                tracing::info!(status = %parsed.status, "payment verification rejected");
                VerificationOutcome::Failed
            }
            Err(err) => {
                tracing::warn!(error = %err, "malformed verification response");
                VerificationOutcome::Error
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    restaurant_id: i64,
    session_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct PopularItemsResponse {
    #[serde(default)]
    items: Vec<MenuSuggestion>,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    status: String,
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
