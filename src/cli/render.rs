//! Plain-text views for the terminal front end

use crate::config::NegotiationConfig;
use crate::negotiation::{FinishReason, NegotiationSession, Phase};
use crate::types::format_eur;

/// Visual weight of the abort-chance banner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Elevated,
    High,
}

impl RiskLevel {
    pub fn for_chance(chance: u8) -> Self {
        if chance > 50 {
            RiskLevel::High
        } else if chance > 25 {
            RiskLevel::Elevated
        } else {
            RiskLevel::Low
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            RiskLevel::Low => "[ ]",
            RiskLevel::Elevated => "[!]",
            RiskLevel::High => "[!!]",
        }
    }
}

/// Render the view for `phase`, with an optional notice under it
pub fn render(
    phase: Phase,
    session: &NegotiationSession,
    config: &NegotiationConfig,
    notice: Option<&str>,
) -> String {
    let mut out = match phase {
        Phase::Vignette => vignette(config),
        Phase::Thinking => thinking(),
        Phase::Negotiating => negotiating(session),
        Phase::Decision => decision(session),
        Phase::Abort => abort(session),
        Phase::Finish => finish(session),
    };

    if let Some(notice) = notice {
        out.push_str(&format!("\n! {}\n", notice));
    }
    out
}

/// Prompt line listing the actions available in `phase`
pub fn prompt(phase: Phase) -> &'static str {
    match phase {
        Phase::Vignette => "I agree that my inputs are stored anonymously [y] / quit [q] > ",
        Phase::Negotiating => "Your counter-offer in EUR, [a] accept offer, [q] quit > ",
        Phase::Decision => "[a] accept, [r] reject > ",
        Phase::Abort | Phase::Finish => "[n] new negotiation, [s] survey, [q] quit > ",
        Phase::Thinking => "",
    }
}

pub fn vignette(config: &NegotiationConfig) -> String {
    format!(
        "\n== Designer furniture fair ==\n\
         Imagine the following situation:\n\
         A seller offers a high-end designer leather couch at a furniture fair.\n\
         Comparable sofas sell for between {} and {}.\n\
         You negotiate the sale price, but the seller has a firm lower limit.\n\
         The negotiation lasts a random {}-{} rounds.\n",
        format_eur(2500),
        format_eur(10000),
        config.rounds_min,
        config.rounds_max
    )
}

pub fn thinking() -> String {
    "\nThe seller is thinking... please wait.\n".to_string()
}

pub fn negotiating(session: &NegotiationSession) -> String {
    let chance = session.last_abort_chance();
    let advisory = session
        .pattern_message()
        .map(|message| format!("\n{}\n", message))
        .unwrap_or_default();

    format!(
        "\n== Sales negotiation ==\nParticipant ID: {}\nRound {}\nCurrent offer: {}\n\
         {} Abort probability: {}%\n{}{}",
        session.participant_id(),
        session.round(),
        format_eur(session.current_offer()),
        RiskLevel::for_chance(chance).marker(),
        chance,
        history_table(session),
        advisory
    )
}

pub fn decision(session: &NegotiationSession) -> String {
    format!(
        "\n== Final round ==\nParticipant ID: {}\nLast offer: {}\n{}",
        session.participant_id(),
        format_eur(session.current_offer()),
        history_table(session)
    )
}

pub fn abort(session: &NegotiationSession) -> String {
    format!(
        "\n== Negotiation aborted ==\nParticipant ID: {}\n\
         The seller ended the negotiation.\n\
         Abort probability this round: {}%\n{}",
        session.participant_id(),
        session.last_abort_chance(),
        history_table(session)
    )
}

pub fn finish(session: &NegotiationSession) -> String {
    format!(
        "\n== Negotiation complete ==\nParticipant ID: {}\nResult: {}\n{}",
        session.participant_id(),
        outcome_text(session),
        history_table(session)
    )
}

/// One-line summary of how the session ended
pub fn outcome_text(session: &NegotiationSession) -> String {
    if session.is_accepted() {
        let deal = session.deal_price().unwrap_or(session.current_offer());
        format!("Agreement in round {} at {}.", session.round(), format_eur(deal))
    } else if session.finish_reason() == Some(FinishReason::Abort) {
        "Negotiation aborted by the seller.".to_string()
    } else {
        "Maximum number of rounds reached.".to_string()
    }
}

/// History table, empty before the first round is recorded
pub fn history_table(session: &NegotiationSession) -> String {
    if session.history().is_empty() {
        return String::new();
    }

    let rows: Vec<String> = session
        .history()
        .iter()
        .map(|record| {
            let counter = record
                .buyer_counter
                .map_or_else(|| "-".to_string(), format_eur);
            format!(
                "{:>5}  {:>14}  {:>14}  {:>9}",
                record.round,
                format_eur(record.seller_offer),
                counter,
                if record.accepted { "Yes" } else { "No" }
            )
        })
        .collect();

    format!(
        "\nHistory\n{:>5}  {:>14}  {:>14}  {:>9}\n{}\n",
        "Round",
        "Seller offer",
        "Counter-offer",
        "Accepted?",
        rows.join("\n")
    )
}
