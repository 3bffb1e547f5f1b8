//! Payment gateway collaborator seam.
//!
//! The widget never touches card data: it opens a hosted checkout with the
//! server-supplied parameters and waits for exactly one of two signals,
//! completed (with a receipt to verify) or dismissed. Gateways load their
//! client libraries lazily on first use; [`LazyGateway`] is that readiness
//! gate, memoized so the preparation runs at most once.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use tablechat_core::error::Result;
use tablechat_core::payment::GatewaySignal;
use tablechat_core::protocol::PaymentBlock;

/// Display name shown by the checkout.
pub const CHECKOUT_NAME: &str = "Restaurant Order";
/// Description line shown by the checkout.
pub const CHECKOUT_DESCRIPTION: &str = "Order Payment";

/// Parameters handed to the gateway when opening a checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub key: String,
    pub amount: f64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
}

impl CheckoutRequest {
    /// Builds the checkout invocation from a server payment block.
    pub fn from_block(block: &PaymentBlock) -> Self {
        Self {
            key: block.key.clone(),
            amount: block.amount,
            currency: block.currency.clone(),
            name: CHECKOUT_NAME.to_string(),
            description: CHECKOUT_DESCRIPTION.to_string(),
            order_id: block.order_id.clone(),
        }
    }
}

/// The external checkout collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Prepares the gateway for use (client library load, etc.).
    async fn ensure_ready(&self) -> Result<()>;

    /// Opens a checkout and resolves once the user completes or dismisses.
    async fn open_checkout(&self, request: CheckoutRequest) -> Result<GatewaySignal>;
}

/// Wraps a gateway so preparation happens once, on first use.
pub struct LazyGateway<G> {
    inner: G,
    ready: OnceCell<()>,
}

impl<G> LazyGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            ready: OnceCell::new(),
        }
    }
}

#[async_trait]
impl<G: PaymentGateway> PaymentGateway for LazyGateway<G> {
    async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async { self.inner.ensure_ready().await })
            .await?;
        Ok(())
    }

    async fn open_checkout(&self, request: CheckoutRequest) -> Result<GatewaySignal> {
        self.ensure_ready().await?;
        self.inner.open_checkout(request).await
    }
}
