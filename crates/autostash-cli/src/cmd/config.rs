use crate::locate::Locations;
use crate::output::print_json;
use anyhow::Context;
use autostash_core::config::Config;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Write a config file with default values if none exists
    Init,

    /// Set one key (interval_secs, include_untracked, format, log_file)
    Set { key: String, value: String },

    /// Print the config file location
    Path,
}

pub fn run(loc: &Locations, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(loc, json),
        ConfigSubcommand::Init => init(loc),
        ConfigSubcommand::Set { key, value } => set(loc, &key, &value),
        ConfigSubcommand::Path => {
            println!("{}", loc.config.display());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(loc: &Locations, json: bool) -> anyhow::Result<()> {
    let config = Config::load(&loc.config).context("failed to load config")?;
    let log_file = config.log_path().context("cannot locate audit log")?;

    if json {
        return print_json(&serde_json::json!({
            "config_file": loc.config,
            "trackfile": loc.trackfile,
            "interval_secs": config.interval_secs,
            "include_untracked": config.include_untracked,
            "format": config.format,
            "log_file": log_file,
        }));
    }

    println!("Config file:        {}", loc.config.display());
    println!("Tracklist:          {}", loc.trackfile.display());
    println!("Interval:           {}s", config.interval_secs);
    println!("Include untracked:  {}", config.include_untracked);
    println!("Format:             {}", config.format);
    println!("Audit log:          {}", log_file.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(loc: &Locations) -> anyhow::Result<()> {
    if Config::init(&loc.config).context("failed to write config")? {
        println!("Wrote default config to {}", loc.config.display());
    } else {
        println!("Config already exists at {}", loc.config.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn set(loc: &Locations, key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = Config::load(&loc.config).context("failed to load config")?;
    config.set(key, value)?;
    config.save(&loc.config).context("failed to save config")?;
    println!("Set {key} = {value}");
    Ok(())
}
