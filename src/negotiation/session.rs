//! Negotiation session state and the factory that creates it

use crate::config::NegotiationConfig;
use crate::random::RandomSource;
use crate::types::{Money, ParticipantId};
use serde::{Deserialize, Serialize};

use super::types::{FinishReason, RoundRecord};

/// Scale factors a session can be dimensioned with
pub const SCALE_FACTORS: [f64; 3] = [1.0, 1.3, 1.5];
/// Seller's floor before scaling, rounded to 50 after scaling
pub const ABSOLUTE_FLOOR: f64 = 3500.0;
/// Seller's opening offer before scaling
pub const BASE_INITIAL_OFFER: f64 = 3728.0;

/// `round(v / 50) × 50`
pub fn round_to_nearest_50(value: f64) -> Money {
    ((value / 50.0).round() * 50.0) as Money
}

/// Shuffle-without-replacement queue over [`SCALE_FACTORS`]
#[derive(Clone, Debug, Default)]
pub struct ScaleFactorQueue {
    queue: Vec<f64>,
}

impl ScaleFactorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factors left before the next reshuffle
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Take the next factor, refilling and reshuffling when empty
    pub fn next_factor(&mut self, rng: &mut impl RandomSource) -> f64 {
        if self.queue.is_empty() {
            self.refill(rng);
        }
        self.queue.pop().unwrap_or(SCALE_FACTORS[0])
    }

    /// Fisher–Yates
    fn refill(&mut self, rng: &mut impl RandomSource) {
        self.queue = SCALE_FACTORS.to_vec();
        for i in (1..self.queue.len()).rev() {
            let j = rng.index_below(i + 1);
            self.queue.swap(i, j);
        }
        tracing::debug!(queue = ?self.queue, "Refilled scale factor queue");
    }
}

/// A single negotiation attempt between the scripted seller and the buyer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationSession {
    participant_id: ParticipantId,
    round: u32,
    max_rounds: u32,
    scale_factor: f64,
    min_price: Money,
    initial_offer: Money,
    current_offer: Money,
    history: Vec<RoundRecord>,
    last_concession: Option<Money>,
    finished: bool,
    accepted: bool,
    finish_reason: Option<FinishReason>,
    deal_price: Option<Money>,
    last_abort_chance: u8,
    pattern_message: Option<String>,
}

impl NegotiationSession {
    /// Create a fresh session, drawing its scale factor and round limit
    pub fn new(
        config: &NegotiationConfig,
        factors: &mut ScaleFactorQueue,
        rng: &mut impl RandomSource,
    ) -> Self {
        let scale_factor = factors.next_factor(rng);
        let max_rounds = rng.int_inclusive(config.rounds_min, config.rounds_max);
        Self::with_factor(scale_factor, max_rounds)
    }

    /// Create a session with a fixed scale factor and round limit
    pub fn with_factor(scale_factor: f64, max_rounds: u32) -> Self {
        let min_price = round_to_nearest_50(ABSOLUTE_FLOOR * scale_factor);
        let initial_offer = (BASE_INITIAL_OFFER * scale_factor).round() as Money;

        let session = Self {
            participant_id: ParticipantId::generate(),
            round: 1,
            max_rounds: max_rounds.max(1),
            scale_factor,
            min_price,
            initial_offer,
            current_offer: initial_offer,
            history: Vec::new(),
            last_concession: None,
            finished: false,
            accepted: false,
            finish_reason: None,
            deal_price: None,
            last_abort_chance: 0,
            pattern_message: None,
        };

        tracing::info!(
            participant = %session.participant_id,
            factor = scale_factor,
            max_rounds = session.max_rounds,
            initial_offer,
            min_price,
            "New negotiation session"
        );

        session
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn min_price(&self) -> Money {
        self.min_price
    }

    pub fn initial_offer(&self) -> Money {
        self.initial_offer
    }

    pub fn current_offer(&self) -> Money {
        self.current_offer
    }

    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn last_concession(&self) -> Option<Money> {
        self.last_concession
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    pub fn deal_price(&self) -> Option<Money> {
        self.deal_price
    }

    pub fn last_abort_chance(&self) -> u8 {
        self.last_abort_chance
    }

    pub fn pattern_message(&self) -> Option<&str> {
        self.pattern_message.as_deref()
    }

    /// Whether this is the last round the seller will counter in
    pub fn is_final_round(&self) -> bool {
        self.round >= self.max_rounds
    }

    /// Buyer counters in history order, skipping accept/reject rows
    pub fn buyer_counters(&self) -> impl Iterator<Item = Money> + '_ {
        self.history.iter().filter_map(|record| record.buyer_counter)
    }

    pub(crate) fn push_record(&mut self, buyer_counter: Option<Money>, accepted: bool) {
        self.history.push(RoundRecord {
            round: self.round,
            seller_offer: self.current_offer,
            buyer_counter,
            accepted,
        });
    }

    /// Move to the next seller offer, clamped into `[min_price, initial_offer]`
    pub(crate) fn apply_offer(&mut self, next_offer: Money) {
        let next_offer = next_offer.clamp(self.min_price, self.initial_offer);
        self.last_concession = Some(self.current_offer - next_offer);
        self.current_offer = next_offer;
    }

    pub(crate) fn advance_round(&mut self) {
        if self.round < self.max_rounds {
            self.round += 1;
        }
    }

    pub(crate) fn set_abort_chance(&mut self, chance: u8) {
        self.last_abort_chance = chance;
    }

    pub(crate) fn set_pattern_message(&mut self, message: Option<String>) {
        self.pattern_message = message;
    }

    pub(crate) fn close_accepted(&mut self, deal_price: Money) {
        self.finished = true;
        self.accepted = true;
        self.finish_reason = None;
        self.deal_price = Some(deal_price);
    }

    pub(crate) fn close_unaccepted(&mut self, reason: FinishReason) {
        self.finished = true;
        self.accepted = false;
        self.finish_reason = Some(reason);
        self.deal_price = None;
    }
}
