//! Core types used throughout Haggle

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Whole currency units
pub type Money = i64;

/// Unique identifier for one negotiation attempt
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Generate a new random participant ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Externally supplied identity of the person at the keyboard.
///
/// Survives restarts; every session of the same run shares it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub player_id: String,
    pub proband_code: String,
}

impl Identity {
    const PLAYER_KEYS: [&'static str; 4] = ["player_id", "playerId", "pid", "id"];
    const CODE_KEYS: [&'static str; 3] = ["proband_code", "probandCode", "code"];

    /// Build an identity, generating a player ID when none is given
    pub fn new(player_id: Option<String>, proband_code: Option<String>) -> Self {
        let player_id = player_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(generate_player_id);
        let proband_code = proband_code
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| player_id.clone());

        Self {
            player_id,
            proband_code,
        }
    }

    /// Resolve identity from a parameter map, first matching key wins
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self::resolve(params, None, None)
    }

    /// Like [`Identity::from_params`], with explicit values taking precedence
    pub fn resolve(
        params: &HashMap<String, String>,
        player_id: Option<String>,
        proband_code: Option<String>,
    ) -> Self {
        let lookup = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| params.get(*key))
                .find(|value| !value.is_empty())
                .cloned()
        };

        Self::new(
            player_id.or_else(|| lookup(&Self::PLAYER_KEYS)),
            proband_code.or_else(|| lookup(&Self::CODE_KEYS)),
        )
    }
}

/// `P_<unix millis>_<6 base-36 chars>`
fn generate_player_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("P_{}_{}", millis, suffix)
}

/// Format whole currency units German-style, e.g. `5.500 €`
pub fn format_eur(amount: Money) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-{} €", grouped)
    } else {
        format!("{} €", grouped)
    }
}
