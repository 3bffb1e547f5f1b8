//! Orchestrator behavior tests with scripted collaborator doubles.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tablechat_application::orchestrator::{
    self, ChatWidget, GREETING, PAYMENT_CANCELLED, PAYMENT_SUCCESS, SEND_FAILED, VERIFYING,
};
use tablechat_core::command::UserAction;
use tablechat_core::conversation::ConversationEntry;
use tablechat_core::error::{ChatClientError, Result};
use tablechat_core::payment::GatewaySignal;
use tablechat_core::protocol::{
    GatewayReceipt, MenuSuggestion, OrderLine, OrderSnapshot, PaymentBlock, ServerTurn,
    VerificationOutcome,
};
use tablechat_core::session::TokenStorage;
use tablechat_interaction::{ChatApi, CheckoutRequest, PaymentGateway};

// ===== Collaborator doubles =====

#[derive(Default)]
struct MemoryStorage {
    token: Mutex<Option<String>>,
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }
}

struct ScriptedApi {
    turns: Mutex<VecDeque<Result<ServerTurn>>>,
    sent: Mutex<Vec<(String, String)>>,
    categories: Mutex<Result<Vec<String>>>,
    popular: Mutex<Result<Vec<MenuSuggestion>>>,
    verify_outcome: Mutex<VerificationOutcome>,
    verified: Mutex<Vec<GatewayReceipt>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            turns: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            categories: Mutex::new(Ok(Vec::new())),
            popular: Mutex::new(Ok(Vec::new())),
            verify_outcome: Mutex::new(VerificationOutcome::Success),
            verified: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedApi {
    fn queue_turn(&self, turn: ServerTurn) {
        self.turns.lock().unwrap().push_back(Ok(turn));
    }

    fn queue_error(&self, err: ChatClientError) {
        self.turns.lock().unwrap().push_back(Err(err));
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for ScriptedApi {
    async fn send_message(&self, session_id: &str, message: &str) -> Result<ServerTurn> {
        self.sent
            .lock()
            .unwrap()
            .push((session_id.to_string(), message.to_string()));
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ServerTurn::default()))
    }

    async fn fetch_categories(&self) -> Result<Vec<String>> {
        self.categories.lock().unwrap().clone()
    }

    async fn fetch_popular_items(&self) -> Result<Vec<MenuSuggestion>> {
        self.popular.lock().unwrap().clone()
    }

    async fn verify_payment(&self, receipt: &GatewayReceipt) -> VerificationOutcome {
        self.verified.lock().unwrap().push(receipt.clone());
        *self.verify_outcome.lock().unwrap()
    }
}

#[derive(Default)]
struct ScriptedGateway {
    signals: Mutex<VecDeque<GatewaySignal>>,
    opened: Mutex<Vec<CheckoutRequest>>,
}

impl ScriptedGateway {
    fn queue_signal(&self, signal: GatewaySignal) {
        self.signals.lock().unwrap().push_back(signal);
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn open_checkout(&self, request: CheckoutRequest) -> Result<GatewaySignal> {
        self.opened.lock().unwrap().push(request);
        Ok(self
            .signals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(GatewaySignal::Dismissed))
    }
}

// ===== Fixtures =====

fn order(lines: &[(&str, u32, f64)], total: f64) -> OrderSnapshot {
    OrderSnapshot {
        items: lines
            .iter()
            .map(|(name, quantity, total_price)| OrderLine {
                name: name.to_string(),
                quantity: *quantity,
                total_price: *total_price,
            })
            .collect(),
        total,
    }
}

fn payment_block() -> PaymentBlock {
    PaymentBlock {
        key: "rzp_test".to_string(),
        amount: 36000.0,
        currency: "INR".to_string(),
        order_id: "order_1".to_string(),
    }
}

fn receipt() -> GatewayReceipt {
    GatewayReceipt {
        razorpay_payment_id: "pay_1".to_string(),
        razorpay_order_id: "order_1".to_string(),
        razorpay_signature: "sig_1".to_string(),
    }
}

async fn widget_with(api: Arc<ScriptedApi>, gateway: Arc<ScriptedGateway>) -> ChatWidget {
    ChatWidget::start(api, gateway, Arc::new(MemoryStorage::default()))
        .await
        .unwrap()
}

fn last_bot_text(widget: &ChatWidget) -> Option<&str> {
    widget
        .conversation()
        .entries()
        .iter()
        .rev()
        .find_map(|entry| match entry {
            ConversationEntry::Bot(text) => Some(text.as_str()),
            _ => None,
        })
}

// ===== Startup =====

#[tokio::test]
async fn start_greets_and_loads_catalog() {
    let api = Arc::new(ScriptedApi::default());
    *api.categories.lock().unwrap() = Ok(vec!["Starters".to_string(), "Mains".to_string()]);

    let widget = widget_with(api, Arc::new(ScriptedGateway::default())).await;

    assert_eq!(
        widget.conversation().entries(),
        &[ConversationEntry::Bot(GREETING.to_string())]
    );
    assert!(widget.catalog().is_visible());
    assert!(widget.cart().is_empty());
    assert!(widget.send_enabled());
}

#[tokio::test]
async fn category_fetch_failure_hides_browse_affordance() {
    let api = Arc::new(ScriptedApi::default());
    *api.categories.lock().unwrap() = Err(ChatClientError::transport("connection refused"));

    let widget = widget_with(api, Arc::new(ScriptedGateway::default())).await;
    assert!(!widget.catalog().is_visible());
}

#[tokio::test]
async fn popular_items_seed_a_suggestion_block() {
    let api = Arc::new(ScriptedApi::default());
    *api.popular.lock().unwrap() = Ok(vec![MenuSuggestion {
        name: "Dal Makhani".to_string(),
        price: Some(180.0),
        category: None,
    }]);

    let widget = widget_with(api, Arc::new(ScriptedGateway::default())).await;
    assert!(matches!(
        widget.conversation().entries().last(),
        Some(ConversationEntry::Suggestions(cards)) if cards.len() == 1
    ));
}

// ===== Command dispatch =====

#[tokio::test]
async fn blank_free_text_sends_nothing() {
    let api = Arc::new(ScriptedApi::default());
    let mut widget = widget_with(api.clone(), Arc::new(ScriptedGateway::default())).await;
    let entries_before = widget.conversation().len();

    widget
        .handle_action(UserAction::FreeText("   ".to_string()))
        .await
        .unwrap();

    assert!(api.sent().is_empty());
    assert_eq!(widget.conversation().len(), entries_before);
}

#[tokio::test]
async fn cart_shortcuts_emit_canonical_commands() {
    let api = Arc::new(ScriptedApi::default());
    let mut widget = widget_with(api.clone(), Arc::new(ScriptedGateway::default())).await;

    widget
        .handle_action(UserAction::IncrementLine("Paneer Tikka".to_string()))
        .await
        .unwrap();
    widget
        .handle_action(UserAction::AddSuggestion {
            name: "Butter Naan".to_string(),
            quantity: 3,
        })
        .await
        .unwrap();
    widget
        .handle_action(UserAction::BrowseCategory("Desserts".to_string()))
        .await
        .unwrap();

    let sent: Vec<String> = api.sent().into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        sent,
        vec![
            "add 1 Paneer Tikka".to_string(),
            "add 3 Butter Naan".to_string(),
            "what do you have in Desserts?".to_string(),
        ]
    );
}

// ===== Turn routing =====

#[tokio::test]
async fn menu_turn_appends_reply_and_suggestions_and_leaves_empty_cart_empty() {
    let api = Arc::new(ScriptedApi::default());
    api.queue_turn(ServerTurn {
        reply: Some("Here's our menu".to_string()),
        menu_items: vec![MenuSuggestion {
            name: "Dal Makhani".to_string(),
            price: Some(180.0),
            category: None,
        }],
        ..Default::default()
    });

    let mut widget = widget_with(api, Arc::new(ScriptedGateway::default())).await;
    widget
        .handle_action(UserAction::FreeText("show menu".to_string()))
        .await
        .unwrap();

    let entries = widget.conversation().entries();
    let n = entries.len();
    assert_eq!(
        entries[n - 3],
        ConversationEntry::User("show menu".to_string())
    );
    assert_eq!(
        entries[n - 2],
        ConversationEntry::Bot("Here's our menu".to_string())
    );
    assert!(matches!(&entries[n - 1], ConversationEntry::Suggestions(cards)
        if cards[0].item.name == "Dal Makhani" && cards[0].item.price == Some(180.0)));
    assert!(widget.cart().is_empty());
}

#[tokio::test]
async fn order_turn_replaces_cart_and_orderless_turn_clears_it() {
    let api = Arc::new(ScriptedApi::default());
    api.queue_turn(ServerTurn {
        reply: Some("Added.".to_string()),
        order: Some(order(&[("Dal Makhani", 2, 360.0)], 360.0)),
        ..Default::default()
    });
    api.queue_turn(ServerTurn {
        reply: Some("Anything else?".to_string()),
        ..Default::default()
    });

    let mut widget = widget_with(api, Arc::new(ScriptedGateway::default())).await;

    widget
        .handle_action(UserAction::FreeText("add 2 dal makhani".to_string()))
        .await
        .unwrap();
    assert_eq!(widget.cart().order().unwrap().total, 360.0);
    assert!(widget.cart().actions_enabled());

    widget
        .handle_action(UserAction::FreeText("thanks".to_string()))
        .await
        .unwrap();
    assert!(widget.cart().is_empty());
    assert!(!widget.cart().actions_enabled());
}

#[tokio::test]
async fn adopted_session_token_is_used_on_next_send() {
    let storage = Arc::new(MemoryStorage::default());
    let api = Arc::new(ScriptedApi::default());
    api.queue_turn(ServerTurn {
        reply: Some("hello".to_string()),
        session_id: Some("sess_server".to_string()),
        ..Default::default()
    });
    api.queue_turn(ServerTurn::default());

    let mut widget = ChatWidget::start(
        api.clone(),
        Arc::new(ScriptedGateway::default()),
        storage.clone(),
    )
    .await
    .unwrap();

    widget
        .handle_action(UserAction::FreeText("hi".to_string()))
        .await
        .unwrap();
    assert_eq!(widget.session_token(), "sess_server");
    assert_eq!(
        storage.token.lock().unwrap().as_deref(),
        Some("sess_server")
    );

    widget
        .handle_action(UserAction::FreeText("hi again".to_string()))
        .await
        .unwrap();
    assert_eq!(api.sent()[1].0, "sess_server");
}

#[tokio::test]
async fn transport_failure_apologizes_and_clears_cart() {
    let api = Arc::new(ScriptedApi::default());
    api.queue_turn(ServerTurn {
        order: Some(order(&[("Samosa", 1, 30.0)], 30.0)),
        ..Default::default()
    });
    api.queue_error(ChatClientError::transport("connection reset"));

    let mut widget = widget_with(api, Arc::new(ScriptedGateway::default())).await;

    widget
        .handle_action(UserAction::FreeText("add samosa".to_string()))
        .await
        .unwrap();
    assert!(!widget.cart().is_empty());

    widget
        .handle_action(UserAction::FreeText("confirm".to_string()))
        .await
        .unwrap();
    assert_eq!(last_bot_text(&widget), Some(SEND_FAILED));
    assert!(widget.cart().is_empty());
    assert!(widget.send_enabled());
}

// ===== Payment lifecycle =====

fn order_then_payment_api() -> Arc<ScriptedApi> {
    let api = Arc::new(ScriptedApi::default());
    api.queue_turn(ServerTurn {
        reply: Some("Added.".to_string()),
        order: Some(order(&[("Dal Makhani", 2, 360.0)], 360.0)),
        ..Default::default()
    });
    // The confirming turn carries a payment block but no order.
    api.queue_turn(ServerTurn {
        reply: Some("Pay to confirm your order.".to_string()),
        payment: Some(payment_block()),
        ..Default::default()
    });
    api
}

#[tokio::test]
async fn cancelled_payment_restores_the_cart() {
    let api = order_then_payment_api();
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_signal(GatewaySignal::Dismissed);

    let mut widget = widget_with(api, gateway.clone()).await;

    widget
        .handle_action(UserAction::FreeText("add 2 dal makhani".to_string()))
        .await
        .unwrap();
    let before = widget.cart().order().unwrap().clone();

    widget.handle_action(UserAction::ConfirmOrder).await.unwrap();

    // The checkout opened with the server-supplied parameters.
    assert_eq!(gateway.opened.lock().unwrap()[0].order_id, "order_1");
    // And the cart survived the dismissal, identical to before.
    assert_eq!(last_bot_text(&widget), Some(PAYMENT_CANCELLED));
    assert_eq!(widget.cart().order(), Some(&before));
    assert!(widget.cart().actions_enabled());
}

#[tokio::test]
async fn verified_payment_empties_the_cart() {
    let api = order_then_payment_api();
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_signal(GatewaySignal::Completed(receipt()));

    let mut widget = widget_with(api.clone(), gateway).await;

    widget
        .handle_action(UserAction::FreeText("add 2 dal makhani".to_string()))
        .await
        .unwrap();
    widget.handle_action(UserAction::ConfirmOrder).await.unwrap();

    assert_eq!(api.verified.lock().unwrap().as_slice(), &[receipt()]);
    let texts: Vec<&str> = widget
        .conversation()
        .entries()
        .iter()
        .filter_map(|e| match e {
            ConversationEntry::Bot(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    assert!(texts.contains(&VERIFYING));
    assert_eq!(texts.last(), Some(&PAYMENT_SUCCESS));
    assert!(widget.cart().is_empty());
}

#[tokio::test]
async fn failed_verification_keeps_the_cart() {
    let api = order_then_payment_api();
    *api.verify_outcome.lock().unwrap() = VerificationOutcome::Failed;
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_signal(GatewaySignal::Completed(receipt()));

    let mut widget = widget_with(api, gateway).await;
    widget
        .handle_action(UserAction::FreeText("add 2 dal makhani".to_string()))
        .await
        .unwrap();
    widget.handle_action(UserAction::ConfirmOrder).await.unwrap();

    assert_eq!(last_bot_text(&widget), Some(orchestrator::PAYMENT_FAILED));
    // The payment-bearing turn carried no order, so the cart still shows
    // the pre-payment order.
    assert!(!widget.cart().is_empty());
}

#[tokio::test]
async fn verification_error_keeps_the_cart_and_asks_for_staff() {
    let api = order_then_payment_api();
    *api.verify_outcome.lock().unwrap() = VerificationOutcome::Error;
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_signal(GatewaySignal::Completed(receipt()));

    let mut widget = widget_with(api, gateway).await;
    widget
        .handle_action(UserAction::FreeText("add 2 dal makhani".to_string()))
        .await
        .unwrap();
    widget.handle_action(UserAction::ConfirmOrder).await.unwrap();

    assert_eq!(
        last_bot_text(&widget),
        Some(orchestrator::PAYMENT_UNVERIFIED)
    );
    assert!(!widget.cart().is_empty());
}
