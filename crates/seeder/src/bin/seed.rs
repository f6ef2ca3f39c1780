//! Seeds the competition database.
//!
//! Run with:
//! ```
//! cargo run -p competition-seeder --bin seed -- --data crates/seeder/data/competition_data.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use competition_seeder::SeedInput;
use competition_seeder::config::ConnectionConfig;
use competition_seeder::db::{MemoryBackend, MySqlBackend, SeedReport, Seeder};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Clears and seeds the competition database.")]
struct Args {
    /// Competition data file. Without it a 5-problem competition starting now is seeded.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Keep existing submissions, problems and competitions.
    #[arg(long)]
    no_reset: bool,

    /// Run against an in-memory database instead of MySQL.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let input = SeedInput::load(args.data.as_deref())?;
    let connection = ConnectionConfig::resolve(input.database.as_ref())?;

    let report = if args.dry_run {
        tracing::info!("Dry run: nothing is written to {}", connection);
        let seeder = Seeder::new(MemoryBackend::new()).with_reset(!args.no_reset);
        let report = seeder.run(&input.plan, &connection).await?;

        let tables = seeder.backend().tables();
        for competition in &tables.competitions {
            tracing::info!(
                "  competitions: ({}, {}, {})",
                competition.id,
                competition.start_timestamp,
                competition.end_timestamp
            );
        }
        for problem in &tables.problems {
            tracing::info!(
                "  problems: ({}, {}, {}, {})",
                problem.id,
                problem.competition_id,
                problem.number,
                problem.correct_answer
            );
        }
        report
    } else {
        Seeder::new(MySqlBackend::new())
            .with_reset(!args.no_reset)
            .run(&input.plan, &connection)
            .await?
    };

    log_summary(&report);

    Ok(())
}

fn log_summary(report: &SeedReport) {
    tracing::info!("Seed completed!");
    tracing::info!("  Competition: {}", report.competition_id);
    tracing::info!("  Problems: {}", report.problems_inserted);
    if let Some(cleared) = report.cleared {
        tracing::info!(
            "  Cleared: {} submissions, {} problems, {} competitions",
            cleared.submissions,
            cleared.problems,
            cleared.competitions
        );
    }
}
