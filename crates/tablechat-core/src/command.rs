//! User actions and their canonical outbound message texts.
//!
//! Every shortcut affordance funnels into the same natural-language command
//! channel as free text; nothing is ever executed locally.

/// An intent originating from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Free text typed into the input field.
    FreeText(String),
    /// A browse-by-category control was selected.
    BrowseCategory(String),
    /// "Add" on a suggestion card with the selected quantity.
    AddSuggestion { name: String, quantity: u32 },
    /// "+" on a cart line.
    IncrementLine(String),
    /// "-" on a cart line.
    DecrementLine(String),
    /// Cart-level "Clear".
    ClearCart,
    /// Cart-level "Confirm".
    ConfirmOrder,
}

impl UserAction {
    /// The canonical message text for this action.
    ///
    /// Returns `None` for empty or whitespace-only free text, which is
    /// dropped without a network call.
    pub fn to_message(&self) -> Option<String> {
        match self {
            Self::FreeText(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Self::BrowseCategory(category) => {
                Some(format!("what do you have in {category}?"))
            }
            Self::AddSuggestion { name, quantity } => Some(format!("add {quantity} {name}")),
            Self::IncrementLine(name) => Some(format!("add 1 {name}")),
            Self::DecrementLine(name) => Some(format!("remove 1 {name}")),
            Self::ClearCart => Some("clear".to_string()),
            Self::ConfirmOrder => Some("confirm".to_string()),
        }
    }
}
