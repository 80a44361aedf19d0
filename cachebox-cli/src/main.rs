//! cachebox CLI - Command-line interface
//!
//! Manage named boxes of cached HTTP responses: add URLs, inspect what is
//! cached, validate and heal boxes, and tidy namespaces.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use commands::boxes;
use commands::config::{self, ConfigCommands};
use error::CliError;
use runner::{resolve_config_path, CliRunner};

#[derive(Debug, Parser)]
#[command(name = "cachebox", version, about, long_about = None)]
struct Cli {
    /// Path to config.ini (default: ~/.cachebox/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Box to operate on (default: ledger.default_box)
    #[arg(long = "box", short = 'b', global = true, default_value = "")]
    box_name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Add URLs to a box, binding it to CACHE on first use
    Add {
        /// Cache namespace
        cache: String,

        /// URLs to add
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Show a cached response from a box
    Get {
        url: String,

        /// Write the raw body to stdout
        #[arg(long)]
        body: bool,
    },

    /// List boxes and their cache namespaces
    List,

    /// Show a box's URLs and what is cached
    Show,

    /// Remove a URL from a box
    Remove {
        url: String,

        /// Cache namespace (default: the box's binding)
        #[arg(long)]
        cache: Option<String>,
    },

    /// Remove a box and every entry only it claimed
    Purge,

    /// Validate a URL, or every URL of the box
    Validate {
        url: Option<String>,

        /// Cache namespace (default: the box's binding)
        #[arg(long)]
        cache: Option<String>,
    },

    /// Re-fetch invalid entries
    Heal {
        /// Heal every box
        #[arg(long)]
        all: bool,
    },

    /// Delete entries no box claims
    Tidy {
        /// Namespace to tidy (default: every namespace in the store)
        cache: Option<String>,
    },

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Config(command) = cli.command {
        let path = resolve_config_path(cli.config.as_deref());
        return config::run(command, &path);
    }

    let runner = CliRunner::new(cli.config.as_deref())?;
    let coordinator = runner.coordinator();
    let box_name = cli.box_name.as_str();

    match cli.command {
        Commands::Add { cache, urls } => boxes::run_add(coordinator, box_name, &cache, &urls).await,
        Commands::Get { url, body } => boxes::run_get(coordinator, box_name, &url, body).await,
        Commands::List => boxes::run_list(coordinator),
        Commands::Show => boxes::run_show(coordinator, box_name).await,
        Commands::Remove { url, cache } => {
            boxes::run_remove(coordinator, box_name, cache, &url).await
        }
        Commands::Purge => boxes::run_purge(coordinator, box_name).await,
        Commands::Validate { url, cache } => {
            boxes::run_validate(coordinator, box_name, cache, url).await
        }
        Commands::Heal { all } => boxes::run_heal(coordinator, box_name, all).await,
        Commands::Tidy { cache } => boxes::run_tidy(coordinator, cache).await,
        Commands::Config(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_box() {
        let cli = Cli::try_parse_from([
            "cachebox",
            "add",
            "--box",
            "shell",
            "v1",
            "https://x/a",
            "https://x/b",
        ])
        .unwrap();

        assert_eq!(cli.box_name, "shell");
        match cli.command {
            Commands::Add { cache, urls } => {
                assert_eq!(cache, "v1");
                assert_eq!(urls, vec!["https://x/a", "https://x/b"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_add_requires_urls() {
        assert!(Cli::try_parse_from(["cachebox", "add", "v1"]).is_err());
    }

    #[test]
    fn test_box_defaults_to_empty() {
        let cli = Cli::try_parse_from(["cachebox", "show"]).unwrap();
        assert_eq!(cli.box_name, "");
    }
}
