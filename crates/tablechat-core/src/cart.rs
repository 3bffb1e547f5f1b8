//! Local cart mirror and reconciliation rules.
//!
//! The cart is never computed client-side: every turn either replaces the
//! whole local copy with the server's order snapshot, clears it, or leaves
//! it alone. Which of the three happens is decided by [`CartDirective`],
//! keyed on whether the turn carries an order and whether it carries a
//! payment block. The one extra piece of state is the last known non-empty
//! order, kept so the visible cart can survive a cancelled payment attempt.

use crate::protocol::{OrderSnapshot, ServerTurn};

/// What a server turn means for the local cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartDirective {
    /// The turn carries an order: mirror it wholesale.
    Replace(OrderSnapshot),
    /// No order and no payment: nothing to show.
    Clear,
    /// No order but a payment block: the checkout decides the cart's fate,
    /// so do not touch it yet.
    Leave,
}

impl CartDirective {
    /// Applies the reconciliation decision table to one turn.
    pub fn for_turn(turn: &ServerTurn) -> Self {
        match (&turn.order, &turn.payment) {
            (Some(order), _) => Self::Replace(order.clone()),
            (None, Some(_)) => Self::Leave,
            (None, None) => Self::Clear,
        }
    }
}

/// The local view of the server-authoritative order.
#[derive(Debug, Default)]
pub struct CartState {
    current: Option<OrderSnapshot>,
    last_non_empty: Option<OrderSnapshot>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cart view; the only mutator.
    ///
    /// A `None` or zero-item order produces the explicit empty state and
    /// discards the restore snapshot. A non-empty order becomes both the
    /// current view and the new snapshot.
    pub fn replace(&mut self, order: Option<OrderSnapshot>) {
        match order {
            Some(order) if !order.is_empty() => {
                self.last_non_empty = Some(order.clone());
                self.current = Some(order);
            }
            _ => {
                self.current = None;
                self.last_non_empty = None;
            }
        }
    }

    /// Re-installs the last non-empty order as the visible cart.
    ///
    /// Used on payment cancellation; returns false when there is nothing
    /// to restore.
    pub fn restore_snapshot(&mut self) -> bool {
        match self.last_non_empty.clone() {
            Some(order) => {
                self.current = Some(order);
                true
            }
            None => false,
        }
    }

    /// The currently rendered order, if any.
    pub fn order(&self) -> Option<&OrderSnapshot> {
        self.current.as_ref()
    }

    /// The last known non-empty order, if any.
    pub fn snapshot(&self) -> Option<&OrderSnapshot> {
        self.last_non_empty.as_ref()
    }

    /// True when the cart renders the empty state.
    pub fn is_empty(&self) -> bool {
        self.current.as_ref().is_none_or(|o| o.is_empty())
    }

    /// Cart-level clear/confirm actions are only offered on a non-empty cart.
    pub fn actions_enabled(&self) -> bool {
        !self.is_empty()
    }
}
