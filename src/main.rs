//! Haggle CLI binary

use anyhow::Context;
use clap::Parser;
use haggle::cli::{simulate, Cli, Commands, HaggleApp, RunArgs, SimulationReport};
use haggle::negotiation::NegotiationEngine;
use haggle::random::SeededRandom;
use haggle::telemetry::{JsonLinesSink, RowSink, TraceSink};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout belongs to the negotiation views
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play { run, log_file } => {
            let engine = build_engine(&run, log_file.as_ref(), false)?;
            tracing::info!(player = %engine.identity().player_id, "Starting interactive negotiation");

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut app = HaggleApp::new(engine, stdin, tokio::io::stdout());
            app.run().await.context("interactive negotiation failed")?;
        }

        Commands::Simulate {
            run,
            counters,
            final_answer,
            log_file,
        } => {
            let mut engine = build_engine(&run, log_file.as_ref(), true)?;
            let rejected_inputs = simulate(&mut engine, &counters, final_answer)?;

            let report = SimulationReport {
                config: engine.config().clone(),
                identity: engine.identity().clone(),
                phase: engine.phase(),
                session: engine.session().clone(),
                rejected_inputs,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Config { run } => {
            let resolved = serde_json::json!({
                "config": run.config(),
                "identity": run.identity(),
            });
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
    }

    Ok(())
}

fn build_engine(
    run: &RunArgs,
    log_file: Option<&PathBuf>,
    scripted: bool,
) -> anyhow::Result<NegotiationEngine<SeededRandom>> {
    let mut config = run.config();
    if scripted {
        config = config.without_delay();
    }

    // Without a log file rows go to the tracing output
    let sink: Box<dyn RowSink> = match log_file {
        Some(path) => Box::new(
            JsonLinesSink::append_to(path)
                .with_context(|| format!("cannot open telemetry log {}", path.display()))?,
        ),
        None => Box::new(TraceSink),
    };

    Ok(NegotiationEngine::new(
        config,
        run.identity(),
        SeededRandom::new(run.seed),
        sink,
    ))
}
