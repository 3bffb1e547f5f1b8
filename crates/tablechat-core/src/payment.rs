//! Payment attempt state machine.
//!
//! One attempt at a time moves Idle → AwaitingGateway → AwaitingVerification
//! → (implicitly) Idle. The machine is pure: it validates transitions and
//! tells the caller what to do next; opening the checkout, calling the
//! verification endpoint, and mutating the cart are the orchestrator's job.

use crate::error::{ChatClientError, Result};
use crate::protocol::{GatewayReceipt, PaymentBlock, VerificationOutcome};

/// Where the current attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPhase {
    /// No attempt outstanding.
    Idle,
    /// Checkout handed to the gateway; waiting for completion or dismissal.
    AwaitingGateway,
    /// Gateway reported success; waiting for backend verification.
    AwaitingVerification,
}

impl Default for PaymentPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// What the gateway reported back for an open checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewaySignal {
    /// The user completed payment; receipt fields need verification.
    Completed(GatewayReceipt),
    /// The user dismissed the checkout without paying.
    Dismissed,
}

/// Next step after a gateway signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalStep {
    /// Surface a "verifying" notice, then verify this receipt.
    Verify(GatewayReceipt),
    /// The attempt was cancelled; restore the cart snapshot.
    Cancelled,
}

/// Terminal resolution of a verified attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentResolution {
    /// Verified success: the cart is presumed fulfilled and resets to empty.
    Success,
    /// Gateway-confirmed failure: the cart stays as it was.
    Failed,
    /// The verification call itself failed: cart untouched, manual help.
    Error,
}

/// Tracks the single outstanding payment attempt.
#[derive(Debug, Default)]
pub struct PaymentCoordinator {
    phase: PaymentPhase,
    attempt: Option<PaymentBlock>,
}

impl PaymentCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PaymentPhase {
        self.phase
    }

    /// The parameters of the outstanding attempt, if any.
    pub fn attempt(&self) -> Option<&PaymentBlock> {
        self.attempt.as_ref()
    }

    /// Starts an attempt from a server payment block.
    ///
    /// A new block while one is outstanding replaces it in place; returns
    /// true when a prior attempt was abandoned that way.
    pub fn begin(&mut self, block: PaymentBlock) -> bool {
        let replaced = self.phase != PaymentPhase::Idle;
        self.attempt = Some(block);
        self.phase = PaymentPhase::AwaitingGateway;
        replaced
    }

    /// Drops the outstanding attempt without a gateway signal.
    ///
    /// Used when the checkout could not be opened at all.
    pub fn abandon(&mut self) {
        self.phase = PaymentPhase::Idle;
        self.attempt = None;
    }

    /// Feeds the gateway's completion or dismissal into the machine.
    pub fn gateway_signal(&mut self, signal: GatewaySignal) -> Result<SignalStep> {
        if self.phase != PaymentPhase::AwaitingGateway {
            return Err(ChatClientError::internal(format!(
                "gateway signal received in phase {:?}",
                self.phase
            )));
        }

        match signal {
            GatewaySignal::Completed(receipt) => {
                self.phase = PaymentPhase::AwaitingVerification;
                Ok(SignalStep::Verify(receipt))
            }
            GatewaySignal::Dismissed => {
                self.phase = PaymentPhase::Idle;
                self.attempt = None;
                Ok(SignalStep::Cancelled)
            }
        }
    }

    /// Records the verification outcome, returning the machine to Idle.
    pub fn resolve(&mut self, outcome: VerificationOutcome) -> Result<PaymentResolution> {
        if self.phase != PaymentPhase::AwaitingVerification {
            return Err(ChatClientError::internal(format!(
                "verification outcome received in phase {:?}",
                self.phase
            )));
        }

        self.phase = PaymentPhase::Idle;
        self.attempt = None;

        Ok(match outcome {
            VerificationOutcome::Success => PaymentResolution::Success,
            VerificationOutcome::Failed => PaymentResolution::Failed,
            VerificationOutcome::Error => PaymentResolution::Error,
        })
    }
}
