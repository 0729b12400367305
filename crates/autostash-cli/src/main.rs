mod cmd;
mod locate;
mod output;

use clap::{Parser, Subcommand};
use cmd::{clear::ClearArgs, config::ConfigSubcommand, watch::WatchArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "auto-stash",
    about = "Snapshot uncommitted work in tracked git repositories into the stash on a timer",
    version,
    propagate_version = true
)]
struct Cli {
    /// Tracklist file (default: per-platform config directory)
    #[arg(long, global = true, env = "AUTO_STASH_TRACKFILE")]
    trackfile: Option<PathBuf>,

    /// Config file (default: per-platform config directory)
    #[arg(long, global = true, env = "AUTO_STASH_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tracked directories
    List,

    /// Start tracking a directory
    Add {
        /// Directory to track (~ and $VARS are expanded)
        path: String,
    },

    /// Stop tracking a directory
    Remove {
        /// Directory to stop tracking
        path: String,
    },

    /// Poll tracked repositories and stash their uncommitted changes
    Watch(WatchArgs),

    /// Drop auto-stash entries from tracked repositories
    Clear(ClearArgs),

    /// Inspect and edit the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Print the version
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Watch(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = locate::Locations::resolve(cli.trackfile, cli.config).and_then(|loc| {
        match cli.command {
            Commands::List => cmd::list::run(&loc, cli.json),
            Commands::Add { path } => cmd::add::run(&loc, &path, cli.json),
            Commands::Remove { path } => cmd::remove::run(&loc, &path, cli.json),
            Commands::Watch(args) => cmd::watch::run(&loc, args),
            Commands::Clear(args) => cmd::clear::run(&loc, args, cli.json),
            Commands::Config { subcommand } => cmd::config::run(&loc, subcommand, cli.json),
            Commands::Version => cmd::version::run(cli.json),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
