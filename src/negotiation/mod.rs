//! Negotiation module: session state, seller rules and the engine driving them

pub mod engine;
pub mod rules;
pub mod session;
pub mod types;

pub use engine::{parse_counter, NegotiationEngine};
pub use session::{NegotiationSession, ScaleFactorQueue};
pub use types::{FinishReason, Phase, RoundRecord, SubmitOutcome};
