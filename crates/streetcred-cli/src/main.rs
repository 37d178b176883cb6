//! # streetcred CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// StreetCred operator CLI.
///
/// Milestone arithmetic, location classification, catalog import and
/// award maintenance.
#[derive(Parser, Debug)]
#[command(name = "streetcred", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Earned milestones and progress for a point total.
    Milestones(streetcred_cli::milestones::MilestonesArgs),
    /// Classify a coordinate to a neighborhood or sponsor location.
    Classify(streetcred_cli::classify::ClassifyArgs),
    /// Upload badge artwork and add it to the catalog.
    ImportBadges(streetcred_cli::import_badges::ImportBadgesArgs),
    /// Rewrite a user's awards with badges from named locations.
    Reassign(streetcred_cli::reassign::ReassignArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match &cli.command {
        Commands::Milestones(args) => streetcred_cli::milestones::run(args)?,
        Commands::Classify(args) => streetcred_cli::classify::run(args).await?,
        Commands::ImportBadges(args) => streetcred_cli::import_badges::run(args).await?,
        Commands::Reassign(args) => streetcred_cli::reassign::run(args).await?,
    };
    println!("{output}");

    Ok(())
}
