//! Simulated bracket tournament.
//!
//! Runs one tournament end to end against an in-memory engine and prints the
//! outcome.

use anyhow::Error;
use bk_sim::config::SimConfig;
use bk_sim::logging;
use bk_sim::simulation::Simulation;
use pico_args::Arguments;

const HELP: &str = "\
Run a simulated single-elimination tournament

USAGE:
  bk_sim [OPTIONS]

OPTIONS:
  --type          KIND    team, solo or mixed          [default: env SIM_TOURNAMENT_TYPE or solo]
  --participants  N       Entrants trying to register  [default: env SIM_PARTICIPANTS or 11]
  --seed          SEED    Seed for shuffles and scores [default: env SIM_SEED or OS entropy]

FLAGS:
  -h, --help              Print help information

ENVIRONMENT:
  SIM_MAX_TEAMS                      Team ceiling
  SIM_MAX_PLAYERS                    Player ceiling
  SIM_REGISTRATION_MILLIS            Registration window length
  SIM_REWARD_AMOUNT                  Champion's currency prize
  SIM_FEE_PERCENT                    Withdrawal fee in whole percent
  REGISTRATION_THROTTLE_MAX          Registration attempts per user per window
  REGISTRATION_THROTTLE_WINDOW_SECS  Throttle window length
  REGISTRATION_THROTTLE_CAPACITY     Users tracked by the throttle
  RUST_LOG                           Log filter [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let kind: Option<String> = pargs.opt_value_from_str("--type")?;
    let participants: Option<u32> = pargs.opt_value_from_str("--participants")?;
    let seed: Option<u64> = pargs.opt_value_from_str("--seed")?;

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = SimConfig::from_env(kind, participants, seed)?;
    tracing::info!(
        kind = %config.tournament.kind,
        participants = config.tournament.participants,
        seed = ?config.seed,
        "Starting simulation"
    );

    let report = Simulation::new(config).run().await?;

    println!("Tournament:   {} ({})", report.tournament.name, report.tournament.id);
    println!("Status:       {}", report.tournament.status);
    println!(
        "Registration: {} admitted, {} duplicate, {} full, {} late, {} throttled",
        report.registration.admitted,
        report.registration.duplicates,
        report.registration.full,
        report.registration.late,
        report.registration.throttled
    );
    println!("Games played: {}", report.matches_played);
    if let Some(champion) = report.tournament.champion {
        println!("Champion:     {champion}");
    }
    for receipt in &report.receipts {
        println!(
            "Withdrawal:   {} (fee {}, net {}, remaining {})",
            receipt.amount, receipt.fee, receipt.net, receipt.remaining
        );
    }
    if let Some(team_reward) = &report.team_reward {
        println!(
            "Team reward:  {} split {} ways, {}",
            team_reward.reward.name,
            team_reward.distribution.len(),
            team_reward.status
        );
    }

    Ok(())
}
