//! CLI module for Haggle

pub mod app;
pub mod commands;
pub mod render;

pub use app::{simulate, HaggleApp, SimulationReport};
pub use commands::{Cli, Commands, FinalAnswer, RunArgs};
