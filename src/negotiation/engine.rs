//! Negotiation engine drives one buyer through the seller's state machine

use std::time::Duration;

use crate::config::NegotiationConfig;
use crate::error::{HaggleError, Result};
use crate::random::{RandomSource, SeededRandom};
use crate::telemetry::{RowSink, TelemetryRow, TraceSink};
use crate::types::{Identity, Money};

use super::rules;
use super::session::{NegotiationSession, ScaleFactorQueue};
use super::types::{FinishReason, Phase, SubmitOutcome};

/// Parse a raw counter-offer: trimmed, comma accepted as decimal separator,
/// rounded to whole units. Empty, non-finite and negative input is rejected.
pub fn parse_counter(raw: &str) -> Result<Money> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(HaggleError::InvalidCounterOffer(
            "Please enter a valid number >= 0".to_string(),
        ));
    }

    let normalized = trimmed.replacen(',', ".", 1);
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value.round() as Money),
        _ => Err(HaggleError::InvalidCounterOffer(format!(
            "Please enter a valid number >= 0, got '{}'",
            trimmed
        ))),
    }
}

/// Owns the single session slot and applies the seller's rules to it
pub struct NegotiationEngine<R: RandomSource = SeededRandom> {
    config: NegotiationConfig,
    identity: Identity,
    rng: R,
    factors: ScaleFactorQueue,
    session: NegotiationSession,
    phase: Phase,
    pending: Option<Phase>,
    sink: Box<dyn RowSink>,
}

impl NegotiationEngine<SeededRandom> {
    /// Engine with OS entropy and telemetry going to `tracing`
    pub fn with_defaults(config: NegotiationConfig, identity: Identity) -> Self {
        Self::new(config, identity, SeededRandom::from_entropy(), Box::new(TraceSink))
    }
}

impl<R: RandomSource> NegotiationEngine<R> {
    /// Create new negotiation engine, showing the vignette
    pub fn new(
        config: NegotiationConfig,
        identity: Identity,
        mut rng: R,
        sink: Box<dyn RowSink>,
    ) -> Self {
        let mut factors = ScaleFactorQueue::new();
        let session = NegotiationSession::new(&config, &mut factors, &mut rng);

        Self {
            config,
            identity,
            rng,
            factors,
            session,
            phase: Phase::Vignette,
            pending: None,
            sink,
        }
    }

    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn session(&self) -> &NegotiationSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Phase waiting behind the current think delay
    pub fn pending(&self) -> Option<Phase> {
        self.pending
    }

    /// Leave the vignette and open the negotiation.
    ///
    /// A session that already saw play is replaced by a fresh one.
    pub fn start(&mut self) -> Result<()> {
        if self.phase != Phase::Vignette {
            return Err(HaggleError::InvalidStateTransition(format!(
                "Cannot start from {:?}",
                self.phase
            )));
        }

        if !self.session.history().is_empty() || self.session.is_finished() {
            self.swap_session();
        }

        tracing::info!(participant = %self.session.participant_id(), "Negotiation started");
        self.phase = Phase::Negotiating;
        Ok(())
    }

    /// Handle the buyer's counter-offer.
    ///
    /// Invalid input returns [`HaggleError::InvalidCounterOffer`] and leaves
    /// the session untouched. Otherwise exactly one history row and one
    /// telemetry row are recorded.
    pub fn submit_counter(&mut self, raw: &str) -> Result<SubmitOutcome> {
        self.ensure_input(&[Phase::Negotiating])?;
        let counter = parse_counter(raw)?;

        let factor = self.session.scale_factor();
        let prev_offer = self.session.current_offer();

        if rules::should_auto_accept(
            &self.config,
            factor,
            self.session.initial_offer(),
            self.session.min_price(),
            prev_offer,
            counter as f64,
        ) {
            self.session.push_record(Some(counter), true);
            self.emit(Some(counter), true, true, Some(counter));
            self.session.close_accepted(counter);
            self.begin_thinking(Phase::Finish);

            tracing::info!(
                round = self.session.round(),
                deal_price = counter,
                "Seller accepted counter-offer"
            );
            return Ok(SubmitOutcome::Accepted {
                deal_price: counter,
            });
        }

        if rules::is_extreme_offer(factor, counter as f64) {
            return Ok(self.abort(counter, 100));
        }

        let decision = rules::maybe_abort(&self.session, counter as f64, &mut self.rng);
        self.session.set_abort_chance(decision.chance);
        if decision.triggered {
            return Ok(self.abort(counter, decision.chance));
        }

        let next_offer = rules::compute_next_offer(prev_offer, self.session.min_price());

        self.emit(Some(counter), false, false, None);
        self.session.push_record(Some(counter), false);
        let message = rules::pattern_message(&self.session);
        self.session.set_pattern_message(message);
        self.session.apply_offer(next_offer);

        if self.session.is_final_round() {
            tracing::info!(round = self.session.round(), "Round limit reached, final offer");
            self.begin_thinking(Phase::Decision);
            return Ok(SubmitOutcome::FinalOffer {
                seller_offer: next_offer,
            });
        }

        self.session.advance_round();
        tracing::debug!(
            round = self.session.round(),
            seller_offer = next_offer,
            counter,
            "Seller holds offer"
        );
        self.begin_thinking(Phase::Negotiating);

        Ok(SubmitOutcome::Countered {
            next_round: self.session.round(),
            seller_offer: next_offer,
        })
    }

    /// Buyer takes the seller's current offer
    pub fn accept_offer(&mut self) -> Result<Money> {
        self.ensure_input(&[Phase::Negotiating, Phase::Decision])?;

        let deal_price = self.session.current_offer();
        self.session.push_record(None, true);
        self.emit(None, true, true, Some(deal_price));
        self.session.close_accepted(deal_price);
        self.begin_thinking(Phase::Finish);

        tracing::info!(round = self.session.round(), deal_price, "Buyer accepted seller offer");
        Ok(deal_price)
    }

    /// Buyer turns down the final offer
    pub fn reject_final(&mut self) -> Result<()> {
        self.ensure_input(&[Phase::Decision])?;

        self.session.push_record(None, false);
        self.emit(None, false, true, None);
        self.session.close_unaccepted(FinishReason::MaxRounds);
        self.begin_thinking(Phase::Finish);

        tracing::info!(round = self.session.round(), "Buyer rejected final offer");
        Ok(())
    }

    /// Resolve the pending transition once the think delay is over
    pub fn complete_thinking(&mut self) -> Result<Phase> {
        let next = self.pending.take().ok_or_else(|| {
            HaggleError::InvalidStateTransition("No transition pending".to_string())
        })?;

        self.phase = next;
        Ok(next)
    }

    /// Draw how long the seller "thinks" before the next view
    pub fn think_delay(&mut self) -> Duration {
        let low = u32::try_from(self.config.think_delay_ms_min).unwrap_or(u32::MAX);
        let high = u32::try_from(self.config.think_delay_ms_max).unwrap_or(u32::MAX);
        Duration::from_millis(u64::from(self.rng.int_inclusive(low, high)))
    }

    /// Throw the current session away and return to the vignette.
    ///
    /// Any pending transition belongs to the old session and is dropped.
    pub fn restart(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("Dropping pending transition on restart");
        }
        self.swap_session();
        self.phase = Phase::Vignette;
    }

    fn swap_session(&mut self) {
        self.session = NegotiationSession::new(&self.config, &mut self.factors, &mut self.rng);
    }

    fn ensure_input(&self, allowed: &[Phase]) -> Result<()> {
        if self.pending.is_some() {
            return Err(HaggleError::TransitionPending);
        }
        if self.session.is_finished() {
            return Err(HaggleError::SessionFinished);
        }
        if !allowed.contains(&self.phase) {
            return Err(HaggleError::InvalidStateTransition(format!(
                "Action not allowed in {:?}",
                self.phase
            )));
        }
        Ok(())
    }

    fn begin_thinking(&mut self, next: Phase) {
        self.pending = Some(next);
        self.phase = Phase::Thinking;
    }

    fn abort(&mut self, counter: Money, chance: u8) -> SubmitOutcome {
        self.session.set_abort_chance(chance);
        self.session.push_record(Some(counter), false);
        self.emit(Some(counter), false, true, None);
        self.session.close_unaccepted(FinishReason::Abort);
        self.phase = Phase::Abort;

        tracing::info!(round = self.session.round(), counter, chance, "Seller aborted negotiation");
        SubmitOutcome::Aborted { chance }
    }

    fn emit(
        &mut self,
        buyer_counter: Option<Money>,
        accepted: bool,
        finished: bool,
        deal_price: Option<Money>,
    ) {
        let row = TelemetryRow::for_session(
            &self.session,
            &self.identity,
            buyer_counter,
            accepted,
            finished,
            deal_price,
        );
        self.sink.send_row(&row);
    }
}
