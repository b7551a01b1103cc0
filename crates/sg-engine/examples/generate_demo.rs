//! End-to-end run against the built-in sample universe.
//!
//! Uses the configured backend (`LLM_PROTOCOL=canned` runs offline) and saves
//! the table as CSV, by default to `generated_scenarios.csv`:
//! `LLM_PROTOCOL=canned cargo run -p sg-engine --example generate_demo -- out.csv`

use sg_data::sample_universe;
use sg_engine::{BehaviorProfile, ScenGenConfig, ScenarioGenerator, ScenarioRequest};
use tracing_subscriber::EnvFilter;

const INSTRUCTION: &str = "Generate severe but plausible stress scenarios for a Swiss bank: \
    a 2008-style rate shock, a credit spread blowout and a strong CHF appreciation.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "generated_scenarios.csv".to_string());

    let config = ScenGenConfig::load()?;
    println!(
        "Backend: {} ({}, model {})",
        config.backend.protocol, config.backend.base_url, config.backend.model
    );

    let universe = sample_universe()?;
    println!(
        "Sample universe: {} risk factors, {} counterparties, {} contracts",
        universe.risk_factors.len(),
        universe.counterparties.len(),
        universe.contracts.len()
    );

    let generator = ScenarioGenerator::from_config(&config)?;
    let request = ScenarioRequest::new(INSTRUCTION)
        .with_count(config.generation.num_scenarios)
        .with_type(config.generation.scenario_type)
        .with_profile(BehaviorProfile::Named(config.generation.profile.clone()));
    let outcome = generator.generate(&universe, &request).await?;

    println!("\nGenerated {} scenarios (run {}):", outcome.scenarios.len(), outcome.run_id);
    for scenario in &outcome.scenarios {
        println!(
            "  - {} [{}] {} shocks",
            scenario.display_name(),
            scenario.scenario_type,
            scenario.shocks.len()
        );
    }

    println!("\nShocks by factor type:");
    for (factor_type, count) in outcome.table.counts_by_factor_type() {
        println!("  {:<14} {}", factor_type, count);
    }
    for issue in &outcome.issues {
        println!("  warning: {}", issue);
    }

    outcome.table.save_csv(&output)?;
    println!("\nSaved {} rows to {}", outcome.table.len(), output);
    Ok(())
}
