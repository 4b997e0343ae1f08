//! Haggle terminal application wiring the engine to stdin/stdout

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::config::NegotiationConfig;
use crate::error::{HaggleError, Result};
use crate::negotiation::{NegotiationEngine, NegotiationSession, Phase};
use crate::random::RandomSource;
use crate::types::Identity;

use super::commands::FinalAnswer;
use super::render;

/// What the loop does after handling one line of input
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Notice(String),
    Quit,
}

/// Interactive front end: renders views, relays buyer actions to the engine
pub struct HaggleApp<R: RandomSource, I, O> {
    engine: NegotiationEngine<R>,
    input: Lines<I>,
    output: O,
}

impl<R, I, O> HaggleApp<R, I, O>
where
    R: RandomSource,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    pub fn new(engine: NegotiationEngine<R>, input: I, output: O) -> Self {
        Self {
            engine,
            input: input.lines(),
            output,
        }
    }

    pub fn engine(&self) -> &NegotiationEngine<R> {
        &self.engine
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Run until the buyer quits, input ends or Ctrl+C interrupts a delay
    pub async fn run(&mut self) -> Result<()> {
        let mut notice: Option<String> = None;

        loop {
            if self.engine.phase() == Phase::Thinking {
                if self.think().await? == Flow::Quit {
                    break;
                }
                continue;
            }

            let view = render::render(
                self.engine.phase(),
                self.engine.session(),
                self.engine.config(),
                notice.take().as_deref(),
            );
            self.write(&view).await?;
            self.write(render::prompt(self.engine.phase())).await?;

            let Some(line) = self.input.next_line().await? else {
                tracing::debug!("Input closed");
                break;
            };

            match self.handle(line.trim()) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Notice(text)) => notice = Some(text),
                Ok(Flow::Quit) => break,
                Err(e) if e.is_recoverable() => notice = Some(e.to_string()),
                Err(e) => return Err(e),
            }
        }

        self.write("\nGoodbye.\n").await
    }

    /// Show the thinking view and wait; input is locked until the delay ends
    async fn think(&mut self) -> Result<Flow> {
        self.write(&render::thinking()).await?;
        let delay = self.engine.think_delay();

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                let next = self.engine.complete_thinking()?;
                tracing::debug!(?next, ?delay, "Think delay elapsed");
                Ok(Flow::Continue)
            }
            Ok(()) = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted during think delay");
                Ok(Flow::Quit)
            }
        }
    }

    fn handle(&mut self, line: &str) -> Result<Flow> {
        let command = line.to_ascii_lowercase();

        match (self.engine.phase(), command.as_str()) {
            (_, "q" | "quit") => Ok(Flow::Quit),

            (Phase::Vignette, "y" | "yes") => {
                self.engine.start()?;
                Ok(Flow::Continue)
            }
            (Phase::Vignette, _) => Ok(Flow::Notice(
                "Please agree to the terms with [y] to start.".to_string(),
            )),

            (Phase::Negotiating | Phase::Decision, "a" | "accept") => {
                self.engine.accept_offer()?;
                Ok(Flow::Continue)
            }
            (Phase::Negotiating, _) => {
                let outcome = self.engine.submit_counter(line)?;
                tracing::debug!(?outcome, next = ?outcome.destination(), "Counter-offer handled");
                Ok(Flow::Continue)
            }

            (Phase::Decision, "r" | "reject") => {
                self.engine.reject_final()?;
                Ok(Flow::Continue)
            }
            (Phase::Decision, _) => Ok(Flow::Notice(
                "Please accept [a] or reject [r] the last offer.".to_string(),
            )),

            (Phase::Abort | Phase::Finish, "n" | "new") => {
                self.engine.restart();
                Ok(Flow::Continue)
            }
            (Phase::Abort | Phase::Finish, "s" | "survey") => Ok(Flow::Notice(format!(
                "Survey: {}",
                self.engine.config().survey_url
            ))),
            (Phase::Abort | Phase::Finish, _) => Ok(Flow::Notice(
                "Start a new negotiation [n], open the survey [s] or quit [q].".to_string(),
            )),

            (Phase::Thinking, _) => Err(HaggleError::TransitionPending),
        }
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

/// Outcome of a scripted run
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub config: NegotiationConfig,
    pub identity: Identity,
    pub phase: Phase,
    pub session: NegotiationSession,
    /// Inputs turned away as invalid, with the reason
    pub rejected_inputs: Vec<String>,
}

/// Drive the engine through `counters` without any think delay.
///
/// Stops early once the seller accepts or aborts. If the final-round prompt
/// is reached, `final_answer` resolves it.
pub fn simulate<R: RandomSource>(
    engine: &mut NegotiationEngine<R>,
    counters: &[String],
    final_answer: FinalAnswer,
) -> Result<Vec<String>> {
    engine.start()?;
    let mut rejected = Vec::new();

    for raw in counters {
        if engine.phase() != Phase::Negotiating {
            break;
        }

        match engine.submit_counter(raw) {
            Ok(outcome) => tracing::debug!(?outcome, raw = %raw, "Scripted counter-offer"),
            Err(HaggleError::InvalidCounterOffer(reason)) => rejected.push(reason),
            Err(e) => return Err(e),
        }

        if engine.pending().is_some() {
            engine.complete_thinking()?;
        }
    }

    if engine.phase() == Phase::Decision {
        match final_answer {
            FinalAnswer::Accept => {
                engine.accept_offer()?;
            }
            FinalAnswer::Reject => engine.reject_final()?,
        }
        engine.complete_thinking()?;
    }

    Ok(rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::FinishReason;
    use crate::random::ScriptedRandom;
    use crate::telemetry::ChannelSink;
    use std::collections::HashMap;

    fn engine(rounds: u32, draws: &[u32]) -> NegotiationEngine<ScriptedRandom> {
        let mut params = HashMap::new();
        params.insert("rmin".to_string(), rounds.to_string());
        params.insert("rmax".to_string(), rounds.to_string());
        params.insert("tmin".to_string(), "0".to_string());
        params.insert("tmax".to_string(), "0".to_string());

        // Shuffle and round-count draws first, factor 1.0 ends up on top
        let rng = ScriptedRandom::new([0, 0, 0].iter().chain(draws).copied());
        NegotiationEngine::new(
            NegotiationConfig::resolve(&params),
            Identity::new(Some("tester".to_string()), None),
            rng,
            Box::new(ChannelSink::channel().0),
        )
    }

    fn run_app(engine: NegotiationEngine<ScriptedRandom>, input: &str) -> (NegotiationSession, String) {
        tokio_test::block_on(async {
            let mut app = HaggleApp::new(engine, input.as_bytes(), Vec::new());
            app.run().await.unwrap();
            let session = app.engine().session().clone();
            let output = String::from_utf8(app.into_output()).unwrap();
            (session, output)
        })
    }

    #[test]
    fn test_interactive_auto_accept() {
        // Think delays draw zero from the script as well
        let (session, output) = run_app(engine(8, &[]), "y\n3650\nq\n");

        assert!(session.is_accepted());
        assert_eq!(session.deal_price(), Some(3650));
        assert!(output.contains("Designer furniture fair"));
        assert!(output.contains("The seller is thinking"));
        assert!(output.contains("Agreement in round 1 at 3.650 €."));
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[test]
    fn test_interactive_invalid_input_reprompts() {
        let (session, output) = run_app(engine(8, &[]), "y\nabc\n");

        assert!(session.history().is_empty());
        assert!(output.contains("Invalid counter-offer"));
        assert_eq!(output.matches("== Sales negotiation ==").count(), 2);
    }

    #[test]
    fn test_interactive_vignette_requires_consent() {
        let (_, output) = run_app(engine(8, &[]), "maybe\n");
        assert!(output.contains("Please agree to the terms"));
        assert!(!output.contains("== Sales negotiation =="));
    }

    #[test]
    fn test_interactive_final_round_and_survey() {
        // Abort roll 100 for the only counter, zero think delays
        let (session, output) = run_app(engine(1, &[100]), "y\n3000\nr\ns\n");

        assert_eq!(session.finish_reason(), Some(FinishReason::MaxRounds));
        assert!(output.contains("== Final round =="));
        assert!(output.contains("Maximum number of rounds reached."));
        assert!(output.contains("Survey: https://"));
    }

    #[test]
    fn test_interactive_restart_after_abort() {
        let (session, output) = run_app(engine(8, &[]), "y\n1000\nn\n");

        assert!(output.contains("== Negotiation aborted =="));
        assert!(output.contains("Abort probability this round: 100%"));
        // Back at the vignette with a fresh session
        assert!(session.history().is_empty());
        assert_eq!(output.matches("Designer furniture fair").count(), 2);
    }

    #[test]
    fn test_think_delay_completes_without_interrupt() {
        let mut engine = engine(8, &[100]);
        engine.start().unwrap();
        engine.submit_counter("3000").unwrap();

        tokio_test::block_on(async {
            let mut app = HaggleApp::new(engine, "".as_bytes(), Vec::new());
            assert_eq!(app.think().await.unwrap(), Flow::Continue);
            assert_eq!(app.engine().phase(), Phase::Negotiating);
            assert_eq!(app.engine().session().round(), 2);
        });
    }

    #[test]
    fn test_simulate_reaches_final_offer() {
        let mut engine = engine(2, &[100, 100]);
        let counters: Vec<String> = ["abc", "3000", "3000", "3100"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rejected = simulate(&mut engine, &counters, FinalAnswer::Accept).unwrap();

        assert_eq!(rejected.len(), 1);
        assert_eq!(engine.phase(), Phase::Finish);
        let session = engine.session();
        assert!(session.is_accepted());
        assert_eq!(session.deal_price(), Some(3728));
        // Two counters plus the final acceptance; the last counter is never used
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn test_simulate_stops_after_abort() {
        let mut engine = engine(8, &[]);
        let counters = vec!["1000".to_string(), "3650".to_string()];

        simulate(&mut engine, &counters, FinalAnswer::Reject).unwrap();

        assert_eq!(engine.phase(), Phase::Abort);
        assert_eq!(engine.session().history().len(), 1);
    }
}
