//! Run configuration resolved from flat key/value parameters

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::form_urlencoded;

use crate::types::Money;

pub const DEFAULT_INITIAL_OFFER: f64 = 5500.0;
pub const DEFAULT_MIN_PRICE_FACTOR: f64 = 0.70;
pub const DEFAULT_ACCEPT_MARGIN: f64 = 0.12;
pub const DEFAULT_ROUNDS: (u32, u32) = (8, 12);
pub const DEFAULT_THINK_DELAY_MS: (u64, u64) = (1200, 2800);
pub const DEFAULT_ACCEPT_RANGE: (f64, f64) = (4700.0, 4800.0);
pub const DEFAULT_SURVEY_URL: &str = "https://docs.google.com/forms/d/e/1FAIpQLSer8gWrQ0hr4Nkygt9vaXsgGGA36JwYdFt3a4ClYDQWgnWQIw/viewform?usp=dialog";

/// Fully resolved negotiation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationConfig {
    pub initial_offer: f64,
    pub min_price: Money,
    pub min_price_factor: f64,
    pub accept_margin: f64,
    pub rounds_min: u32,
    pub rounds_max: u32,
    pub think_delay_ms_min: u64,
    pub think_delay_ms_max: u64,
    pub accept_range_min: f64,
    pub accept_range_max: f64,
    pub survey_url: String,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self::resolve(&HashMap::new())
    }
}

impl NegotiationConfig {
    /// Resolve a configuration from a parameter map.
    ///
    /// Never fails: malformed, non-finite or missing values fall back to the
    /// documented defaults. `i`, `mf`, `am`, `armin` and `armax` also treat
    /// zero as missing.
    pub fn resolve(params: &HashMap<String, String>) -> Self {
        let initial_offer = nonzero(params, "i").unwrap_or(DEFAULT_INITIAL_OFFER);
        let min_price_factor = nonzero(params, "mf").unwrap_or(DEFAULT_MIN_PRICE_FACTOR);
        let accept_margin = nonzero(params, "am").unwrap_or(DEFAULT_ACCEPT_MARGIN);

        let min_price = number(params, "min")
            .unwrap_or_else(|| (initial_offer * min_price_factor).round())
            .round() as Money;

        let (rounds_min, rounds_max) = ordered(
            rounds(params, "rmin").unwrap_or(DEFAULT_ROUNDS.0),
            rounds(params, "rmax").unwrap_or(DEFAULT_ROUNDS.1),
        );
        let (think_delay_ms_min, think_delay_ms_max) = ordered(
            integer(params, "tmin").unwrap_or(DEFAULT_THINK_DELAY_MS.0),
            integer(params, "tmax").unwrap_or(DEFAULT_THINK_DELAY_MS.1),
        );
        let (accept_range_min, accept_range_max) = ordered(
            nonzero(params, "armin").unwrap_or(DEFAULT_ACCEPT_RANGE.0),
            nonzero(params, "armax").unwrap_or(DEFAULT_ACCEPT_RANGE.1),
        );

        let survey_url = params
            .get("survey")
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_SURVEY_URL.to_string());

        let config = Self {
            initial_offer,
            min_price,
            min_price_factor,
            accept_margin,
            rounds_min: rounds_min.max(1),
            rounds_max: rounds_max.max(1),
            think_delay_ms_min,
            think_delay_ms_max,
            accept_range_min,
            accept_range_max,
            survey_url,
        };

        tracing::debug!(?config, "Resolved negotiation config");
        config
    }

    /// Resolve from a URL query string such as `i=5500&rmin=8&rmax=12`
    pub fn from_query(query: &str) -> Self {
        Self::resolve(&parse_query(query))
    }

    pub fn think_delay_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.think_delay_ms_min),
            Duration::from_millis(self.think_delay_ms_max),
        )
    }

    /// Configuration for scripted runs: defaults with no think delay
    pub fn without_delay(mut self) -> Self {
        self.think_delay_ms_min = 0;
        self.think_delay_ms_max = 0;
        self
    }
}

/// Split a query string into a key/value map.
///
/// A leading `?` is ignored and values are form-urlencoded. Later duplicates
/// do not override earlier keys.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }

    params
}

/// Parse `key=value` pairs given on the command line
pub fn parse_pairs<I, S>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pairs
        .into_iter()
        .filter_map(|pair| {
            let (key, value) = pair.as_ref().split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn number(params: &HashMap<String, String>, key: &str) -> Option<f64> {
    let raw = params.get(key)?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn nonzero(params: &HashMap<String, String>, key: &str) -> Option<f64> {
    number(params, key).filter(|v| *v != 0.0)
}

/// Leading integer part, negative values rejected
fn integer(params: &HashMap<String, String>, key: &str) -> Option<u64> {
    let raw = params.get(key)?.trim();
    let digits: &str = raw
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw, |end| &raw[..end]);
    digits.parse().ok()
}

/// Round bound, out-of-range values treated as missing
fn rounds(params: &HashMap<String, String>, key: &str) -> Option<u32> {
    integer(params, key).and_then(|v| u32::try_from(v).ok())
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = NegotiationConfig::default();

        assert_eq!(config.initial_offer, 5500.0);
        assert_eq!(config.min_price, 3850);
        assert_eq!(config.accept_margin, 0.12);
        assert_eq!((config.rounds_min, config.rounds_max), (8, 12));
        assert_eq!((config.think_delay_ms_min, config.think_delay_ms_max), (1200, 2800));
        assert_eq!((config.accept_range_min, config.accept_range_max), (4700.0, 4800.0));
        assert_eq!(config.survey_url, DEFAULT_SURVEY_URL);
    }

    #[test]
    fn test_explicit_min_price_wins() {
        let config = NegotiationConfig::resolve(&params(&[("min", "4000"), ("mf", "0.5")]));
        assert_eq!(config.min_price, 4000);

        let config = NegotiationConfig::resolve(&params(&[("i", "6000"), ("mf", "0.5")]));
        assert_eq!(config.min_price, 3000);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = NegotiationConfig::resolve(&params(&[
            ("i", "abc"),
            ("min", "NaN"),
            ("am", "inf"),
            ("rmin", "x"),
            ("armax", "0"),
        ]));

        assert_eq!(config.initial_offer, 5500.0);
        assert_eq!(config.min_price, 3850);
        assert_eq!(config.accept_margin, 0.12);
        assert_eq!(config.rounds_min, 8);
        assert_eq!(config.accept_range_max, 4800.0);
    }

    #[test]
    fn test_integer_keys_take_leading_digits() {
        let config = NegotiationConfig::resolve(&params(&[("rmin", "3.7"), ("rmax", "5rounds")]));
        assert_eq!((config.rounds_min, config.rounds_max), (3, 5));

        let config = NegotiationConfig::resolve(&params(&[("tmin", "0"), ("tmax", "0")]));
        assert_eq!(config.think_delay_bounds(), (Duration::ZERO, Duration::ZERO));
    }

    #[test]
    fn test_reversed_bounds_are_swapped() {
        let config = NegotiationConfig::resolve(&params(&[("rmin", "12"), ("rmax", "4")]));
        assert_eq!((config.rounds_min, config.rounds_max), (4, 12));
    }

    #[test]
    fn test_parse_query() {
        let parsed = parse_query("?i=6000&survey=https%3A%2F%2Fexample.org%2Fform&code=a+b&flag&i=1");

        assert_eq!(parsed.get("i").map(String::as_str), Some("6000"));
        assert_eq!(parsed.get("survey").map(String::as_str), Some("https://example.org/form"));
        assert_eq!(parsed.get("code").map(String::as_str), Some("a b"));
        assert_eq!(parsed.get("flag").map(String::as_str), Some(""));

        let config = NegotiationConfig::from_query("i=6000&rmax=10");
        assert_eq!(config.initial_offer, 6000.0);
        assert_eq!(config.min_price, 4200);
        assert_eq!(config.rounds_max, 10);
    }

    #[test]
    fn test_parse_query_keeps_malformed_escapes() {
        let parsed = parse_query("code=%+1&pid=a%2&note=50%25");

        assert_eq!(parsed.get("code").map(String::as_str), Some("% 1"));
        assert_eq!(parsed.get("pid").map(String::as_str), Some("a%2"));
        assert_eq!(parsed.get("note").map(String::as_str), Some("50%"));
    }

    #[test]
    fn test_oversized_rounds_fall_back() {
        let config = NegotiationConfig::from_query("rmin=4294967297&rmax=4294967298");
        assert_eq!((config.rounds_min, config.rounds_max), (8, 12));

        let config = NegotiationConfig::from_query("rmin=3&rmax=99999999999999999999");
        assert_eq!((config.rounds_min, config.rounds_max), (3, 12));
    }

    #[test]
    fn test_parse_pairs() {
        let parsed = parse_pairs(["am=0.2", " rmin = 4 ", "garbage"]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("rmin").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_config_serialization() {
        let config = NegotiationConfig::default().without_delay();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: NegotiationConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
