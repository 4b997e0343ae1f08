//! Negotiation types and state machine

use crate::types::Money;
use serde::{Deserialize, Serialize};

/// Why a session ended without the buyer's acceptance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Seller walked away
    Abort,
    /// Final round reached and the last offer was rejected
    MaxRounds,
}

/// One row of the negotiation history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub seller_offer: Money,
    /// `None` when the buyer answered with accept/reject instead of a number
    pub buyer_counter: Option<Money>,
    pub accepted: bool,
}

/// Negotiation state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Intro screen, waiting for consent
    Vignette,
    /// Waiting for a counter-offer or acceptance
    Negotiating,
    /// Seller is "thinking"; input is locked until the pending transition resolves
    Thinking,
    /// Final round reached, buyer must accept or reject the last offer
    Decision,
    /// Seller aborted
    Abort,
    /// Deal or final rejection
    Finish,
}

impl Phase {
    /// Check if negotiation is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Abort | Phase::Finish)
    }

    /// Check if the buyer can act
    pub fn accepts_input(&self) -> bool {
        matches!(self, Phase::Negotiating | Phase::Decision)
    }
}

/// Result of a buyer's counter-offer
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// Counter met the seller's acceptance rules
    Accepted { deal_price: Money },
    /// Seller walked away with the given chance (percent)
    Aborted { chance: u8 },
    /// Seller held its offer; negotiation moves to `next_round`
    Countered { next_round: u32, seller_offer: Money },
    /// Round limit reached; buyer must decide on `seller_offer`
    FinalOffer { seller_offer: Money },
}

impl SubmitOutcome {
    /// Phase shown once the think delay (if any) is over
    pub fn destination(&self) -> Phase {
        match self {
            SubmitOutcome::Accepted { .. } => Phase::Finish,
            SubmitOutcome::Aborted { .. } => Phase::Abort,
            SubmitOutcome::Countered { .. } => Phase::Negotiating,
            SubmitOutcome::FinalOffer { .. } => Phase::Decision,
        }
    }
}
