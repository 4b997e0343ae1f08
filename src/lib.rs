//! Haggle: a scripted single-session bargaining simulation
//!
//! A synthetic seller negotiates a price against a human buyer over a bounded
//! number of rounds. The crate provides:
//! - Run configuration resolved from flat key/value parameters
//! - The seller's decision rules (auto-accept, abort dice, salami detection)
//! - The negotiation engine owning the session and its state machine
//! - Telemetry rows for every round and terminal event
//! - A terminal front end

pub mod cli;
pub mod config;
pub mod error;
pub mod negotiation;
pub mod random;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::NegotiationConfig;
pub use error::{HaggleError, Result};
pub use negotiation::{NegotiationEngine, NegotiationSession, Phase, SubmitOutcome};
pub use random::{RandomSource, SeededRandom};
pub use types::{format_eur, Identity, Money, ParticipantId};
