//! The widget orchestrator.
//!
//! Owns the whole client-side state (session, cart, conversation, catalog,
//! payment coordinator) and wires user actions to the backend: format the
//! canonical command, post it with the session token, then fan the server
//! turn out to the conversation log (always), the payment coordinator
//! (when a payment block is present), and the cart (per the decision
//! table). Every network-facing failure is converted into a conversation
//! message here instead of propagating to the embedder.

use std::sync::Arc;

use tablechat_core::cart::{CartDirective, CartState};
use tablechat_core::catalog::CategoryCatalog;
use tablechat_core::command::UserAction;
use tablechat_core::conversation::ConversationLog;
use tablechat_core::error::Result;
use tablechat_core::payment::{PaymentCoordinator, PaymentResolution, SignalStep};
use tablechat_core::protocol::PaymentBlock;
use tablechat_core::session::{SessionStore, TokenStorage};
use tablechat_interaction::{ChatApi, CheckoutRequest, PaymentGateway};

/// Greeting appended before any user input.
pub const GREETING: &str = "Hi! I am your restaurant assistant. You can ask for the menu, \
     browse by category, add items, adjust quantities, view your cart, and confirm your order here.";
/// Fallback when a turn carries no reply text.
pub const NO_REPLY: &str = "No reply received from server.";
/// Generic apology for transport/protocol failures on a chat send.
pub const SEND_FAILED: &str = "Error talking to server. Please try again in a moment.";
/// Status notice surfaced before the verification call.
pub const VERIFYING: &str = "Verifying your payment, please wait...";
pub const PAYMENT_SUCCESS: &str = "Payment successful. Your order is confirmed.";
pub const PAYMENT_FAILED: &str = "Payment failed. Please try again.";
pub const PAYMENT_UNVERIFIED: &str = "Could not verify payment. Please contact staff.";
pub const PAYMENT_CANCELLED: &str = "Payment cancelled. Your cart is still active.";
/// The checkout itself could not be opened.
pub const CHECKOUT_FAILED: &str = "Could not open the payment window. Please try again.";

/// One embeddable chat widget instance.
pub struct ChatWidget {
    api: Arc<dyn ChatApi>,
    gateway: Arc<dyn PaymentGateway>,
    session: SessionStore,
    cart: CartState,
    log: ConversationLog,
    catalog: CategoryCatalog,
    payment: PaymentCoordinator,
    in_flight: bool,
}

impl ChatWidget {
    /// Builds and initializes a widget.
    ///
    /// Loads (or creates) the session token, fetches the category catalog
    /// once, seeds the popular-items suggestion block when available, and
    /// appends the greeting. Catalog and popular-items failures degrade
    /// silently; a storage failure is fatal, as is invalid configuration
    /// upstream of this call.
    pub async fn start(
        api: Arc<dyn ChatApi>,
        gateway: Arc<dyn PaymentGateway>,
        storage: Arc<dyn TokenStorage>,
    ) -> Result<Self> {
        let session = SessionStore::open(storage)?;

        let mut widget = Self {
            api,
            gateway,
            session,
            cart: CartState::new(),
            log: ConversationLog::new(),
            catalog: CategoryCatalog::hidden(),
            payment: PaymentCoordinator::new(),
            in_flight: false,
        };

        widget.log.append_bot(GREETING);

        widget.catalog = match widget.api.fetch_categories().await {
            Ok(categories) => CategoryCatalog::new(categories),
            Err(err) => {
                tracing::warn!(error = %err, "category fetch failed; hiding browse affordance");
                CategoryCatalog::hidden()
            }
        };

        match widget.api.fetch_popular_items().await {
            Ok(items) if !items.is_empty() => widget.log.append_suggestions(items),
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(error = %err, "popular-items fetch failed; skipping seed");
            }
        }

        Ok(widget)
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.log
    }

    /// Mutable log access for front-ends driving suggestion selectors.
    pub fn conversation_mut(&mut self) -> &mut ConversationLog {
        &mut self.log
    }

    pub fn cart(&self) -> &CartState {
        &self.cart
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn session_token(&self) -> &str {
        self.session.token()
    }

    /// False while a request is in flight; the send affordance mirrors this.
    pub fn send_enabled(&self) -> bool {
        !self.in_flight
    }

    /// Handles one user action end to end.
    ///
    /// Blank free text is dropped without a network call. Transport and
    /// protocol failures become conversation messages, never errors; the
    /// returned error covers only local defects (token persistence).
    pub async fn handle_action(&mut self, action: UserAction) -> Result<()> {
        let Some(message) = action.to_message() else {
            return Ok(());
        };

        if self.in_flight {
            tracing::debug!("send suppressed: a request is already in flight");
            return Ok(());
        }

        self.log.append_user(message.clone());

        self.in_flight = true;
        let result = self.round_trip(&message).await;
        // Guaranteed cleanup: the send affordance comes back on success
        // and failure alike.
        self.in_flight = false;

        match result {
            Ok(()) => Ok(()),
            Err(err) if err.is_transport() || err.is_protocol() => {
                tracing::error!(error = %err, "chat round trip failed");
                self.log.append_bot(SEND_FAILED);
                // Conservative fallback: without a server answer the local
                // mirror is unreliable.
                self.cart.replace(None);
                Ok(())
            }
            // Local defects (token persistence) are the embedder's problem.
            Err(err) => Err(err),
        }
    }

    async fn round_trip(&mut self, message: &str) -> Result<()> {
        let turn = self.api.send_message(self.session.token(), message).await?;

        if let Err(err) = self.session.adopt(turn.session_id.as_deref()) {
            tracing::error!(error = %err, "failed to persist adopted session token");
            return Err(err);
        }

        // The reply text always lands in the log.
        self.log
            .append_bot(turn.reply.clone().unwrap_or_else(|| NO_REPLY.to_string()));

        if !turn.menu_items.is_empty() {
            self.log.append_suggestions(turn.menu_items.clone());
        }

        // Cart reconciliation runs before the payment drive: the snapshot
        // must reflect this turn before the checkout can cancel into it.
        match CartDirective::for_turn(&turn) {
            CartDirective::Replace(order) => self.cart.replace(Some(order)),
            CartDirective::Clear => self.cart.replace(None),
            CartDirective::Leave => {}
        }

        if let Some(block) = turn.payment.clone() {
            self.drive_payment(block).await;
        }

        Ok(())
    }

    /// Runs one payment attempt to a terminal state.
    async fn drive_payment(&mut self, block: PaymentBlock) {
        let request = CheckoutRequest::from_block(&block);
        if self.payment.begin(block) {
            tracing::warn!("new payment block replaced an outstanding attempt");
        }

        let signal = match self.gateway.open_checkout(request).await {
            Ok(signal) => signal,
            Err(err) => {
                tracing::error!(error = %err, "failed to open checkout");
                self.payment.abandon();
                self.log.append_bot(CHECKOUT_FAILED);
                return;
            }
        };

        let step = match self.payment.gateway_signal(signal) {
            Ok(step) => step,
            Err(err) => {
                tracing::error!(error = %err, "payment machine rejected gateway signal");
                return;
            }
        };

        match step {
            SignalStep::Verify(receipt) => {
                self.log.append_bot(VERIFYING);
                let outcome = self.api.verify_payment(&receipt).await;
                match self.payment.resolve(outcome) {
                    Ok(PaymentResolution::Success) => {
                        self.log.append_bot(PAYMENT_SUCCESS);
                        // The order is presumed fulfilled server-side.
                        self.cart.replace(None);
                    }
                    Ok(PaymentResolution::Failed) => self.log.append_bot(PAYMENT_FAILED),
                    Ok(PaymentResolution::Error) => self.log.append_bot(PAYMENT_UNVERIFIED),
                    Err(err) => {
                        tracing::error!(error = %err, "payment machine rejected outcome");
                    }
                }
            }
            SignalStep::Cancelled => {
                self.log.append_bot(PAYMENT_CANCELLED);
                if !self.cart.restore_snapshot() {
                    tracing::debug!("payment cancelled with no cart snapshot to restore");
                }
            }
        }
    }
}
