//! Terminal reference embedding for the TableChat widget.
//!
//! A rustyline REPL drives the orchestrator: free text goes straight to the
//! backend, slash commands cover the shortcut affordances (browse, cart
//! +/-, clear, confirm), and a console gateway stands in for the hosted
//! checkout popup.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::io::Write as IoWrite;
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use tablechat_application::ChatWidget;
use tablechat_core::command::UserAction;
use tablechat_core::config::ClientConfig;
use tablechat_core::conversation::ConversationEntry;
use tablechat_core::payment::GatewaySignal;
use tablechat_core::protocol::GatewayReceipt;
use tablechat_infrastructure::FileTokenStorage;
use tablechat_interaction::{
    CheckoutRequest, HttpChatClient, LazyGateway, PaymentGateway,
};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/browse".to_string(),
                "/categories".to_string(),
                "/cart".to_string(),
                "/add".to_string(),
                "/plus".to_string(),
                "/minus".to_string(),
                "/clear".to_string(),
                "/confirm".to_string(),
                "/quit".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Stand-in for the hosted checkout: prints the payment parameters and asks
/// the operator to paste the gateway receipt, or press Enter to cancel.
struct ConsoleGateway;

#[async_trait]
impl PaymentGateway for ConsoleGateway {
    async fn ensure_ready(&self) -> tablechat_core::Result<()> {
        Ok(())
    }

    async fn open_checkout(
        &self,
        request: CheckoutRequest,
    ) -> tablechat_core::Result<GatewaySignal> {
        println!();
        println!("{}", "=== Payment checkout ===".bold());
        println!("  {}: {}", "Order".bold(), request.order_id);
        println!(
            "  {}: {} {}",
            "Amount".bold(),
            request.amount,
            request.currency
        );
        println!("  {} ({})", request.name, request.description);
        println!("Paste the gateway payment id to complete, or press Enter to cancel.");

        let payment_id = prompt_line("payment id> ")?;
        if payment_id.is_empty() {
            return Ok(GatewaySignal::Dismissed);
        }

        let signature = prompt_line("signature> ")?;

        Ok(GatewaySignal::Completed(GatewayReceipt {
            razorpay_payment_id: payment_id,
            razorpay_order_id: request.order_id,
            razorpay_signature: signature,
        }))
    }
}

fn prompt_line(prompt: &str) -> tablechat_core::Result<String> {
    print!("{prompt}");
    std::io::stdout().flush().map_err(|e| {
        tablechat_core::ChatClientError::gateway(format!("stdout flush failed: {e}"))
    })?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).map_err(|e| {
        tablechat_core::ChatClientError::gateway(format!("stdin read failed: {e}"))
    })?;
    Ok(line.trim().to_string())
}

/// Maps one REPL line to a user action, or a local command.
enum ReplInput {
    Action(UserAction),
    ShowCategories,
    ShowCart,
    Quit,
    Unknown(String),
}

fn parse_line(line: &str) -> ReplInput {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return ReplInput::Action(UserAction::FreeText(trimmed.to_string()));
    }

    let (command, rest) = match trimmed.split_once(' ') {
        Some((c, r)) => (c, r.trim()),
        None => (trimmed, ""),
    };

    match command {
        "/browse" if !rest.is_empty() => {
            ReplInput::Action(UserAction::BrowseCategory(rest.to_string()))
        }
        "/add" => match rest.split_once(' ') {
            Some((qty, name)) => match qty.parse::<u32>() {
                Ok(quantity) if quantity >= 1 && !name.trim().is_empty() => {
                    ReplInput::Action(UserAction::AddSuggestion {
                        name: name.trim().to_string(),
                        quantity,
                    })
                }
                _ => ReplInput::Unknown(trimmed.to_string()),
            },
            None => ReplInput::Unknown(trimmed.to_string()),
        },
        "/plus" if !rest.is_empty() => {
            ReplInput::Action(UserAction::IncrementLine(rest.to_string()))
        }
        "/minus" if !rest.is_empty() => {
            ReplInput::Action(UserAction::DecrementLine(rest.to_string()))
        }
        "/clear" => ReplInput::Action(UserAction::ClearCart),
        "/confirm" => ReplInput::Action(UserAction::ConfirmOrder),
        "/categories" => ReplInput::ShowCategories,
        "/cart" => ReplInput::ShowCart,
        "/quit" | "/exit" => ReplInput::Quit,
        other => ReplInput::Unknown(other.to_string()),
    }
}

/// Prints conversation entries appended since the last render.
fn render_new_entries(widget: &ChatWidget, from: usize) -> usize {
    let entries = widget.conversation().entries();
    for entry in &entries[from..] {
        match entry {
            ConversationEntry::User(text) => {
                println!("{} {}", "you:".blue().bold(), text.blue());
            }
            ConversationEntry::Bot(text) => {
                println!("{} {}", "bot:".green().bold(), text);
            }
            ConversationEntry::Suggestions(cards) => {
                println!("{}", "bot: here are some options:".green().bold());
                for card in cards {
                    let price = card
                        .item
                        .price
                        .map(|p| format!(" (₹{p})"))
                        .unwrap_or_default();
                    println!("  - {}{}", card.item.name.bold(), price.dimmed());
                }
                println!(
                    "{}",
                    "  (use /add <qty> <name> to put one in your cart)".dimmed()
                );
            }
        }
    }
    entries.len()
}

fn render_cart(widget: &ChatWidget) {
    match widget.cart().order() {
        Some(order) => {
            println!("{}", "Your cart:".bold());
            for line in &order.items {
                println!(
                    "  {} x{}  ₹{}",
                    line.name.bold(),
                    line.quantity,
                    line.total_price
                );
            }
            println!("  {} ₹{}", "Total:".bold(), order.total);
            println!(
                "{}",
                "  (/plus <name>, /minus <name>, /clear, /confirm)".dimmed()
            );
        }
        None => println!("{}", "Your cart is empty.".dimmed()),
    }
}

fn render_categories(widget: &ChatWidget) {
    if !widget.catalog().is_visible() {
        return;
    }
    let labels = widget.catalog().categories().join(", ");
    println!(
        "{} {}  {}",
        "Browse by category:".bold(),
        labels,
        "(/browse <category>)".dimmed()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            // Missing configuration is fatal: the widget does not mount.
            tracing::error!(error = %err, "invalid configuration, not starting");
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let api = Arc::new(HttpChatClient::new(config.clone()));
    let gateway = Arc::new(LazyGateway::new(ConsoleGateway));
    let storage =
        Arc::new(FileTokenStorage::open_default().context("opening session token storage")?);

    let mut widget = ChatWidget::start(api, gateway, storage)
        .await
        .context("starting chat widget")?;

    println!(
        "{} {}",
        "TableChat".bold(),
        format!("(restaurant {}, {})", config.restaurant_id, config.api_base).dimmed()
    );

    let mut rendered = render_new_entries(&widget, 0);
    render_categories(&widget);

    let mut editor = Editor::<CliHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CliHelper::new()));

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        match parse_line(&line) {
            ReplInput::Quit => break,
            ReplInput::ShowCategories => render_categories(&widget),
            ReplInput::ShowCart => render_cart(&widget),
            ReplInput::Unknown(command) => {
                println!(
                    "{} {}",
                    "unknown command:".yellow(),
                    command
                );
            }
            ReplInput::Action(action) => {
                let cart_was_empty = widget.cart().is_empty();
                widget.handle_action(action).await?;
                rendered = render_new_entries(&widget, rendered);
                if !widget.cart().is_empty() || !cart_was_empty {
                    render_cart(&widget);
                }
            }
        }
    }

    println!("{}", "Bye!".bold());
    Ok(())
}
