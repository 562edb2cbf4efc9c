use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod ui;

use commands::RangeArgs;

#[derive(Parser)]
#[command(name = "chatboard")]
#[command(about = "Collect chat history into SQLite and rank who talks the most.")]
#[command(version)]
struct Cli {
    /// Settings file (missing file means defaults)
    #[arg(long, global = true, default_value = "chatboard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch channels, users and message history into the local database
    Collect {
        /// Database file (overrides `db_path` from the settings file)
        #[arg(long)]
        db: Option<PathBuf>,

        /// API token. Falls back to SLACK_TOKEN, then TOKEN.
        #[arg(long)]
        token: Option<String>,

        /// Fetch messages from this ISO-8601 time instead of resuming
        #[arg(long, value_name = "DATETIME")]
        since: Option<String>,

        /// Fetch messages up to this ISO-8601 time
        #[arg(long, value_name = "DATETIME")]
        until: Option<String>,
    },

    /// Rank users, channels and reactions over a period
    Leaderboard {
        #[arg(long)]
        db: Option<PathBuf>,

        #[command(flatten)]
        range: RangeArgs,

        /// Entries per ranking (overrides `top_n`)
        #[arg(short = 'n', long)]
        top: Option<usize>,
    },

    /// Rank teams from a roster of member emails
    Team {
        #[arg(long)]
        db: Option<PathBuf>,

        #[command(flatten)]
        range: RangeArgs,

        /// Roster file with `[[members]]` entries of `email` and `team`
        #[arg(long, default_value = "team.toml")]
        roster: PathBuf,

        /// Sort by posts per member or total posts
        #[arg(long, default_value = "average", value_parser = ["average", "total"])]
        sort: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing for debug logs (hidden by default)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            db,
            token,
            since,
            until,
        } => commands::collect::run(&cli.config, db, token, since, until).await,
        Commands::Leaderboard { db, range, top } => {
            commands::leaderboard::run(&cli.config, db, &range, top).await
        }
        Commands::Team {
            db,
            range,
            roster,
            sort,
        } => commands::team::run(&cli.config, db, &range, &roster, &sort).await,
    }
}
