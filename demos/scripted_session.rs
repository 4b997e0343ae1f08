//! Scripted session demo: a buyer creeping up in small steps
//!
//! This example walks one negotiation through the seller's rules:
//! 1. Open a session with a fixed seed
//! 2. Submit a run of small counter-offer increases
//! 3. Watch the salami-tactics advisory appear
//! 4. Print every telemetry row the engine emitted
//!
//! Run with: cargo run --example scripted_session

use haggle::cli::render;
use haggle::negotiation::{NegotiationEngine, Phase, SubmitOutcome};
use haggle::telemetry::ChannelSink;
use haggle::{format_eur, Identity, NegotiationConfig, SeededRandom};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info,haggle=debug")
        .init();

    println!("\n╔══════════════════════════════════════════════╗");
    println!("║   Haggle Scripted Session Demo               ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let (sink, mut rows) = ChannelSink::channel();
    let config = NegotiationConfig::from_query("rmin=6&rmax=6").without_delay();
    let identity = Identity::new(Some("demo_player".to_string()), None);
    let mut engine = NegotiationEngine::new(config, identity, SeededRandom::from_seed(2024), Box::new(sink));

    engine.start()?;
    let factor = engine.session().scale_factor();
    println!(
        "Seller opens at {} (scale factor {}, {} rounds)\n",
        format_eur(engine.session().current_offer()),
        factor,
        engine.session().max_rounds()
    );

    // Small steps just above the unacceptable limit
    let mut counter = (2400.0 * factor).round() as i64;
    while engine.phase() == Phase::Negotiating {
        println!("Buyer offers {}", format_eur(counter));

        match engine.submit_counter(&counter.to_string())? {
            SubmitOutcome::Countered { next_round, seller_offer } => {
                println!("   Seller holds at {}, round {} next", format_eur(seller_offer), next_round);
            }
            SubmitOutcome::FinalOffer { seller_offer } => {
                println!("   Final offer: {}", format_eur(seller_offer));
            }
            SubmitOutcome::Accepted { deal_price } => {
                println!("   Deal at {}", format_eur(deal_price));
            }
            SubmitOutcome::Aborted { chance } => {
                println!("   Seller walked away ({}% chance)", chance);
            }
        }

        if let Some(message) = engine.session().pattern_message() {
            println!("   Seller: {}", message);
        }
        if engine.pending().is_some() {
            engine.complete_thinking()?;
        }
        counter += counter / 40;
    }

    if engine.phase() == Phase::Decision {
        println!("\nBuyer rejects the final offer");
        engine.reject_final()?;
        engine.complete_thinking()?;
    }

    println!("{}", render::render(engine.phase(), engine.session(), engine.config(), None));

    println!("Telemetry rows:");
    while let Ok(row) = rows.try_recv() {
        println!("   {}", serde_json::to_string(&row)?);
    }

    Ok(())
}
