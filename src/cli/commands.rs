//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::{parse_pairs, parse_query, NegotiationConfig};
use crate::types::Identity;

#[derive(Parser, Debug)]
#[command(name = "haggle")]
#[command(about = "Haggle - negotiate a price against a scripted seller", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Negotiate interactively in the terminal
    Play {
        #[command(flatten)]
        run: RunArgs,

        /// Append telemetry rows as JSON lines to this file
        #[arg(short, long)]
        log_file: Option<PathBuf>,
    },

    /// Run a scripted list of counter-offers without think delays
    Simulate {
        #[command(flatten)]
        run: RunArgs,

        /// Counter-offer to submit, repeat for each round
        #[arg(short, long = "counter", allow_hyphen_values = true)]
        counters: Vec<String>,

        /// Answer to give if the final-round prompt is reached
        #[arg(short, long, value_enum, default_value = "reject")]
        final_answer: FinalAnswer,

        /// Append telemetry rows as JSON lines to this file
        #[arg(short, long)]
        log_file: Option<PathBuf>,
    },

    /// Print the resolved configuration
    Config {
        #[command(flatten)]
        run: RunArgs,
    },
}

/// Buyer's answer to the final offer
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FinalAnswer {
    Accept,
    Reject,
}

/// Parameters shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Query string with run parameters, e.g. "i=5500&rmin=8&rmax=12"
    #[arg(short, long)]
    pub query: Option<String>,

    /// Single run parameter as KEY=VALUE, overrides the query string
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Seed for reproducible sessions
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Player ID, generated when absent
    #[arg(long)]
    pub player_id: Option<String>,

    /// Proband code, defaults to the player ID
    #[arg(long)]
    pub proband_code: Option<String>,
}

impl RunArgs {
    /// Merged parameter map, `--param` winning over `--query`
    pub fn parameters(&self) -> HashMap<String, String> {
        let mut params = self.query.as_deref().map(parse_query).unwrap_or_default();
        params.extend(parse_pairs(&self.params));
        params
    }

    pub fn config(&self) -> NegotiationConfig {
        NegotiationConfig::resolve(&self.parameters())
    }

    /// Identity from the flags, falling back to the parameter map
    pub fn identity(&self) -> Identity {
        Identity::resolve(
            &self.parameters(),
            self.player_id.clone(),
            self.proband_code.clone(),
        )
    }
}
