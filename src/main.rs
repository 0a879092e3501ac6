//! bxt-stage - stage and push package commits to a bxt server
//!
//! CLI binary for the local staging area.

use anyhow::Result;
use bxt_stage::config::{Config, Overrides};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "bxt-stage")]
#[command(about = "Stage package commits and push them to a bxt server")]
#[command(version)]
struct Cli {
    /// Server URL (overrides config file and BXT_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Config file (defaults to ~/.config/bxt-stage/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// User name (prompted if omitted)
        #[arg(long)]
        user: Option<String>,
    },

    /// Revoke and forget the stored session
    Logout,

    /// List sections known to the server
    Sections,

    /// Stage package files (and their .sig files) for upload
    Add {
        /// Target section, as branch/repository/architecture
        section: String,

        /// Package and signature files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Stage packages for deletion
    Delete {
        /// Section, as branch/repository/architecture
        section: String,

        /// Package names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Stage a copy of packages into another section
    Copy {
        /// Source section
        from: String,

        /// Target section
        to: String,

        /// Package names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Stage a move of packages into another section
    Move {
        /// Source section
        from: String,

        /// Target section
        to: String,

        /// Package names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show staged commits
    Status,

    /// Remove packages, or a whole section, from the staging area
    Unstage {
        /// Section, as branch/repository/architecture
        section: String,

        /// Package names (all of the section if omitted)
        names: Vec<String>,
    },

    /// Drop every staged commit
    Clear,

    /// Push staged commits to the server
    Push,

    /// Trigger a sync with upstream repositories
    Sync,

    /// Snapshot one branch onto another
    Snap {
        /// Branch to copy from
        source_branch: String,

        /// Branch to overwrite
        target_branch: String,

        /// Architecture
        architecture: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "bxt_stage=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(&Overrides {
        config_path: cli.config,
        server_url: cli.url,
    })?;

    match cli.command {
        Commands::Login { user } => cli::run_login(&config, user).await?,
        Commands::Logout => cli::run_logout(&config).await?,
        Commands::Sections => cli::run_sections(&config).await?,
        Commands::Add { section, files } => cli::run_add(&config, &section, &files).await?,
        Commands::Delete { section, names } => cli::run_delete(&config, &section, &names).await?,
        Commands::Copy { from, to, names } => cli::run_copy(&config, &from, &to, &names).await?,
        Commands::Move { from, to, names } => cli::run_move(&config, &from, &to, &names).await?,
        Commands::Status => cli::run_status(&config)?,
        Commands::Unstage { section, names } => cli::run_unstage(&config, &section, &names)?,
        Commands::Clear => cli::run_clear(&config)?,
        Commands::Push => cli::run_push(&config).await?,
        Commands::Sync => cli::run_sync(&config).await?,
        Commands::Snap {
            source_branch,
            target_branch,
            architecture,
        } => cli::run_snap(&config, source_branch, target_branch, architecture).await?,
    }

    Ok(())
}
