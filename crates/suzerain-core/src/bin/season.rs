//! Suzerain season driver
//!
//! Runs the agent for one season against the scripted in-process world and
//! prints the season report as JSON. Usage:
//!
//!   suzerain-season [config.yaml] [seed]

use suzerain_core::{policy_for, AgentConfig, ScriptedWorld, SeasonRunner};
use suzerain_protocol::CharacterId;
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "suzerain_core=info".to_string()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match AgentConfig::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("failed to load config {path}: {e}");
                std::process::exit(1);
            }
        },
        None => AgentConfig::default(),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC0FFEE);

    info!(policy = ?config.policy, seed, "starting season");

    let world = ScriptedWorld::new(seed);
    let policy = policy_for(&config);
    let mut runner = SeasonRunner::new(world, policy, config, CharacterId::new(1));

    let report = match runner.run_season() {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("season aborted: {e}");
            std::process::exit(1);
        }
    };

    info!(
        season = report.season,
        actions = report.actions.len(),
        budget_spent = report.budget_spent,
        "season complete"
    );
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("failed to encode report: {e}");
            std::process::exit(1);
        }
    }
}
