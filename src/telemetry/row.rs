//! Telemetry row format

use crate::negotiation::NegotiationSession;
use crate::types::{Identity, Money, ParticipantId};
use serde::{Deserialize, Serialize};

/// One recorded round or terminal event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRow {
    pub participant_id: ParticipantId,
    pub player_id: String,
    pub proband_code: String,
    pub scale_factor: f64,
    pub round: u32,
    pub seller_offer: Money,
    pub buyer_counter: Option<Money>,
    pub accepted: bool,
    pub finished: bool,
    pub deal_price: Option<Money>,
}

impl TelemetryRow {
    /// Row for the session's current round and seller offer
    pub fn for_session(
        session: &NegotiationSession,
        identity: &Identity,
        buyer_counter: Option<Money>,
        accepted: bool,
        finished: bool,
        deal_price: Option<Money>,
    ) -> Self {
        Self {
            participant_id: session.participant_id().clone(),
            player_id: identity.player_id.clone(),
            proband_code: identity.proband_code.clone(),
            scale_factor: session.scale_factor(),
            round: session.round(),
            seller_offer: session.current_offer(),
            buyer_counter,
            accepted,
            finished,
            deal_price,
        }
    }
}
