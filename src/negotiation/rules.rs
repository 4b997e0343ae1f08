//! Seller decision rules.
//!
//! Everything here is a pure function of the session and the buyer's input.
//! The engine applies the results; nothing in this module mutates state.

use crate::config::NegotiationConfig;
use crate::random::RandomSource;
use crate::types::Money;

use super::session::NegotiationSession;

/// Counters within this fraction of the seller's offer are accepted outright
pub const CLOSE_ENOUGH_FRACTION: f64 = 0.05;
/// Counters below `EXTREME_BASE × factor` end the negotiation immediately
pub const EXTREME_BASE: f64 = 1500.0;
/// Counters below `UNACCEPTABLE_LIMIT × factor` are ignored by pattern detection
pub const UNACCEPTABLE_LIMIT: f64 = 2250.0;

/// `(distance, percent)` pairs, checked top-down, distances before scaling
const ABORT_BANDS: [(f64, u8); 5] = [
    (1000.0, 40),
    (750.0, 30),
    (500.0, 20),
    (250.0, 10),
    (100.0, 5),
];

/// `(lower, upper, max relative increase)` per previous counter, before scaling
const LENIENCY_BANDS: [(f64, f64, f64); 3] = [
    (2250.0, 3000.0, 0.05),
    (3000.0, 4000.0, 0.04),
    (4000.0, 5000.0, 0.03),
];

/// Run length of tiny increases that triggers the advisory message
const SALAMI_RUN: usize = 3;

pub const SALAMI_MESSAGE: &str = "Small increases like these make this difficult. \
Please move closer to your limit, then we will surely find a fair deal faster.";

/// The seller holds its position: the next offer equals the previous one
/// unless that lies below the floor, in which case it snaps up to the floor.
pub fn compute_next_offer(prev_offer: Money, min_price: Money) -> Money {
    prev_offer.max(min_price)
}

/// Whether the seller takes the buyer's counter as the deal
pub fn should_auto_accept(
    config: &NegotiationConfig,
    factor: f64,
    initial_offer: Money,
    min_price: Money,
    prev_offer: Money,
    counter: f64,
) -> bool {
    if !counter.is_finite() {
        return false;
    }

    let prev = prev_offer as f64;
    if (prev - counter).abs() <= prev * CLOSE_ENOUGH_FRACTION {
        tracing::debug!(counter, prev, "Counter within 5% of seller offer");
        return true;
    }

    let range_min = config.accept_range_min * factor;
    let range_max = config.accept_range_max * factor;
    if (range_min..=range_max).contains(&counter) {
        tracing::debug!(counter, range_min, range_max, "Counter inside acceptance range");
        return true;
    }

    let threshold = (min_price as f64).max(initial_offer as f64 * (1.0 - config.accept_margin));
    counter >= threshold
}

/// Percent chance the seller walks away given the gap between both offers
pub fn abort_probability(factor: f64, seller_offer: f64, buyer_offer: f64) -> u8 {
    let diff = (seller_offer - buyer_offer).abs();

    ABORT_BANDS
        .iter()
        .find(|(distance, _)| diff >= distance * factor)
        .map_or(0, |(_, chance)| *chance)
}

/// Whether the counter is so low that the seller aborts unconditionally
pub fn is_extreme_offer(factor: f64, buyer_offer: f64) -> bool {
    buyer_offer < EXTREME_BASE * factor
}

/// Outcome of the abort check for one counter-offer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbortDecision {
    /// Percent chance that was rolled against
    pub chance: u8,
    pub triggered: bool,
}

/// Roll the abort dice for the buyer's counter.
///
/// Extreme counters abort with chance 100 without consuming a draw.
/// Otherwise a uniform draw in `[1, 100]` at or below the chance aborts.
pub fn maybe_abort(
    session: &NegotiationSession,
    buyer_offer: f64,
    rng: &mut impl RandomSource,
) -> AbortDecision {
    let factor = session.scale_factor();

    if is_extreme_offer(factor, buyer_offer) {
        return AbortDecision {
            chance: 100,
            triggered: true,
        };
    }

    let chance = abort_probability(factor, session.current_offer() as f64, buyer_offer);
    let roll = rng.int_inclusive(1, 100);
    tracing::debug!(chance, roll, "Abort roll");

    AbortDecision {
        chance,
        triggered: u32::from(chance) >= roll,
    }
}

fn leniency_for(factor: f64, prev: f64) -> Option<f64> {
    LENIENCY_BANDS
        .iter()
        .find(|(lower, upper, _)| prev >= lower * factor && prev < upper * factor)
        .map(|(_, _, threshold)| *threshold)
}

/// Length of the trailing run of small increases among `counters`
pub fn trailing_small_increase_run(factor: f64, counters: &[f64]) -> usize {
    let mut run = 1;

    for pair in counters.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let diff = next - prev;

        run = match leniency_for(factor, prev) {
            Some(threshold) if diff >= 0.0 && diff <= prev * threshold => run + 1,
            _ => 1,
        };
    }

    run
}

/// Advisory text when the buyer keeps creeping up in tiny steps
pub fn pattern_message(session: &NegotiationSession) -> Option<String> {
    let factor = session.scale_factor();
    let limit = UNACCEPTABLE_LIMIT * factor;

    let counters: Vec<f64> = session
        .buyer_counters()
        .map(|c| c as f64)
        .filter(|c| c.is_finite() && *c >= limit)
        .collect();

    if counters.len() < SALAMI_RUN {
        return None;
    }

    (trailing_small_increase_run(factor, &counters) >= SALAMI_RUN)
        .then(|| SALAMI_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    fn session_with_counters(factor: f64, counters: &[Money]) -> NegotiationSession {
        let mut session = NegotiationSession::with_factor(factor, 20);
        for counter in counters {
            session.push_record(Some(*counter), false);
            session.advance_round();
        }
        session
    }

    #[test]
    fn test_next_offer_holds_position() {
        assert_eq!(compute_next_offer(3728, 3500), 3728);
        assert_eq!(compute_next_offer(3500, 3500), 3500);
        assert_eq!(compute_next_offer(3400, 3500), 3500);
    }

    #[test]
    fn test_auto_accept_within_five_percent() {
        let config = NegotiationConfig::default();
        // |5000 - 4800| = 200 <= 250
        assert!(should_auto_accept(&config, 1.0, 5500, 5400, 5000, 4800.0));
        // 351 away, below the range and below every other threshold
        assert!(!should_auto_accept(&config, 1.0, 5500, 5400, 5000, 4649.0));
    }

    #[test]
    fn test_auto_accept_range_is_scaled() {
        let config = NegotiationConfig::default();
        // factor 1.5: range [7050, 7200], offer far away
        assert!(should_auto_accept(&config, 1.5, 9000, 9000, 9000, 7100.0));
        assert!(!should_auto_accept(&config, 1.5, 9000, 9000, 9000, 7201.0));
        assert!(!should_auto_accept(&config, 1.5, 9000, 9000, 9000, 4750.0));
    }

    #[test]
    fn test_auto_accept_threshold_boundaries() {
        let config = NegotiationConfig::default();
        // initial 10000 × 0.88 = 8800 beats min 5000; prev far above
        let accept = |counter: f64| should_auto_accept(&config, 1.0, 10000, 5000, 20000, counter);

        assert!(accept(10000.0 * (1.0 - config.accept_margin)));
        assert!(accept(8801.0));
        assert!(!accept(8799.0));

        // Floor dominates when higher than the margin threshold
        let accept = |counter: f64| should_auto_accept(&config, 1.0, 10000, 9000, 20000, counter);
        assert!(!accept(8800.0));
        assert!(accept(9000.0));
    }

    #[test]
    fn test_auto_accept_first_round_default_session() {
        let config = NegotiationConfig::default();
        // threshold max(3500, 3728 × 0.88 = 3280.64) = 3500
        assert!(should_auto_accept(&config, 1.0, 3728, 3500, 3728, 3650.0));
        assert!(should_auto_accept(&config, 1.0, 3728, 3500, 3728, 3500.0));
        assert!(!should_auto_accept(&config, 1.0, 3728, 3500, 3728, 3499.0));
    }

    #[test]
    fn test_auto_accept_rejects_non_finite() {
        let config = NegotiationConfig::default();
        assert!(!should_auto_accept(&config, 1.0, 3728, 3500, 3728, f64::NAN));
        assert!(!should_auto_accept(&config, 1.0, 3728, 3500, 3728, f64::INFINITY));
    }

    #[test]
    fn test_abort_probability_bands() {
        assert_eq!(abort_probability(1.0, 3728.0, 2728.0), 40);
        assert_eq!(abort_probability(1.0, 3728.0, 2978.0), 30);
        assert_eq!(abort_probability(1.0, 3728.0, 3228.0), 20);
        assert_eq!(abort_probability(1.0, 3728.0, 3478.0), 10);
        assert_eq!(abort_probability(1.0, 3728.0, 3628.0), 5);
        assert_eq!(abort_probability(1.0, 3728.0, 3629.0), 0);
        // Same gap is milder with a larger factor
        assert_eq!(abort_probability(1.5, 3728.0, 2728.0), 20);
    }

    #[test]
    fn test_abort_probability_monotonic() {
        for factor in [1.0, 1.3, 1.5] {
            let mut previous = u8::MAX;
            for diff in (0..=1600).rev() {
                let chance = abort_probability(factor, 5000.0, 5000.0 - diff as f64);
                assert!(chance <= previous, "factor {} diff {}", factor, diff);
                previous = chance;
            }
        }
    }

    #[test]
    fn test_extreme_offer_aborts_without_roll() {
        let session = NegotiationSession::with_factor(1.0, 10);
        let mut rng = ScriptedRandom::new([100]);

        let decision = maybe_abort(&session, 1000.0, &mut rng);
        assert_eq!(
            decision,
            AbortDecision {
                chance: 100,
                triggered: true
            }
        );
        // The scripted draw was not consumed
        assert_eq!(rng.int_inclusive(1, 100), 100);
    }

    #[test]
    fn test_abort_roll_against_chance() {
        let session = NegotiationSession::with_factor(1.0, 10);

        // gap 1228 -> 40%
        let mut rng = ScriptedRandom::new([40, 41]);
        assert!(maybe_abort(&session, 2500.0, &mut rng).triggered);
        assert!(!maybe_abort(&session, 2500.0, &mut rng).triggered);

        // gap 0 -> 0% never aborts, even on a roll of 1
        let mut rng = ScriptedRandom::new([1]);
        let decision = maybe_abort(&session, 3728.0, &mut rng);
        assert_eq!(decision.chance, 0);
        assert!(!decision.triggered);
    }

    #[test]
    fn test_pattern_detects_salami_tactics() {
        let session = session_with_counters(1.0, &[2400, 2460]);
        assert_eq!(pattern_message(&session), None);

        let session = session_with_counters(1.0, &[2400, 2460, 2518]);
        assert_eq!(pattern_message(&session).as_deref(), Some(SALAMI_MESSAGE));
    }

    #[test]
    fn test_pattern_reset_by_decrease() {
        let session = session_with_counters(1.0, &[2400, 2390, 2460, 2518]);
        // 2390 -> 2460 -> 2518 is still a run of three after the reset
        assert!(pattern_message(&session).is_some());

        let session = session_with_counters(1.0, &[2400, 2460, 2440, 2518]);
        assert_eq!(pattern_message(&session), None);

        let session = session_with_counters(1.0, &[2400, 2460, 2518, 2500]);
        assert_eq!(pattern_message(&session), None);
    }

    #[test]
    fn test_pattern_ignores_low_and_missing_counters() {
        let mut session = session_with_counters(1.0, &[2400, 1000, 2460]);
        session.push_record(None, false);
        session.push_record(Some(2518), false);

        assert!(pattern_message(&session).is_some());
    }

    #[test]
    fn test_pattern_large_step_breaks_run() {
        // 2400 -> 2600 is more than 5%
        let session = session_with_counters(1.0, &[2400, 2600, 2650]);
        assert_eq!(pattern_message(&session), None);
    }

    #[test]
    fn test_pattern_bands_shrink_with_amount() {
        // 3% band above 4000: 4000 -> 4119 -> 4242 qualifies
        assert_eq!(trailing_small_increase_run(1.0, &[4000.0, 4119.0, 4242.0]), 3);
        // 4% would pass, 3% does not
        assert_eq!(trailing_small_increase_run(1.0, &[4000.0, 4150.0, 4250.0]), 2);
        // No leniency from 5000 upwards
        assert_eq!(trailing_small_increase_run(1.0, &[5000.0, 5010.0, 5020.0]), 1);
        // Bands scale with the factor
        assert_eq!(trailing_small_increase_run(1.5, &[3600.0, 3700.0, 3800.0]), 3);
    }
}
