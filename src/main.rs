//! tabsaver: inspect and edit the saved-windows store from the command line.
//!
//! Usage:
//!   tabsaver list            # List saved windows, most recent first
//!   tabsaver show <name>     # Print one saved window as JSON
//!   tabsaver delete <name>   # Delete a saved window
//!   tabsaver config          # Print the effective configuration
//!
//! `--store <path>` overrides the store file from the configuration.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use tabsaver::listing;
use tabsaver::store::FileStore;
use tabsaver::{Config, Engine};

enum Command {
    List,
    Show(String),
    Delete(String),
    Config,
    Help,
}

struct Args {
    command: Command,
    store: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args(std::env::args().skip(1))?;

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(store) = args.store {
        config.store_path = Some(store);
    }

    match args.command {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Config => show_config(&config),
        Command::List => list(&config),
        Command::Show(name) => show(&config, &name),
        Command::Delete(name) => delete(&config, &name),
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut command = None;
    let mut store = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => command = Some(Command::Help),
            "--store" => {
                let path = args.next().context("--store needs a path")?;
                store = Some(PathBuf::from(path));
            }
            "list" => command = Some(Command::List),
            "config" => command = Some(Command::Config),
            "show" | "delete" => {
                let name = args
                    .next()
                    .with_context(|| format!("{arg} needs a window name"))?;
                command = Some(if arg == "show" {
                    Command::Show(name)
                } else {
                    Command::Delete(name)
                });
            }
            _ => bail!("Unknown argument: {arg}"),
        }
        if matches!(command, Some(Command::Help)) {
            break;
        }
    }

    Ok(Args {
        command: command.unwrap_or(Command::List),
        store,
    })
}

fn print_help() {
    println!("tabsaver: saved browser windows");
    println!();
    println!("Usage:");
    println!("  tabsaver [--store <path>] list           List saved windows");
    println!("  tabsaver [--store <path>] show <name>    Print a saved window");
    println!("  tabsaver [--store <path>] delete <name>  Delete a saved window");
    println!("  tabsaver config                          Print the configuration");
}

fn load_engine(config: &Config) -> Result<Engine<FileStore>> {
    let path = config.resolved_store_path()?;
    let store = FileStore::open(path.clone())
        .with_context(|| format!("Failed to open store: {}", path.display()))?;
    Engine::load(store, config).context("Failed to load saved windows")
}

fn list(config: &Config) -> Result<()> {
    let engine = load_engine(config)?;
    let entries = listing::entries(engine.index(), None);
    if entries.is_empty() {
        println!("No saved windows");
        return Ok(());
    }
    for entry in entries {
        if entry.name == entry.display_name {
            println!("{}", entry.label());
        } else {
            println!("{}  [{}]", entry.label(), entry.name);
        }
    }
    Ok(())
}

fn show(config: &Config, name: &str) -> Result<()> {
    let engine = load_engine(config)?;
    let record = engine
        .saved_window(name)
        .with_context(|| format!("No saved window named '{name}'"))?;
    let json = serde_json::to_string_pretty(record).context("Failed to serialize window")?;
    println!("{json}");
    Ok(())
}

fn delete(config: &Config, name: &str) -> Result<()> {
    let mut engine = load_engine(config)?;
    match engine.delete_saved_window(name)? {
        Some(deleted) => println!(
            "Deleted '{}' ({} tabs)",
            deleted.record.display_name,
            deleted.record.tabs.len()
        ),
        None => bail!("No saved window named '{name}'"),
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    println!("# {}", Config::config_path()?.display());
    println!("# store: {}", config.resolved_store_path()?.display());
    let toml = toml::to_string_pretty(config).context("Failed to serialize config")?;
    print!("{toml}");
    Ok(())
}
