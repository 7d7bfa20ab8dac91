use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use section_composer::config::{CliOverrides, ComposerConfig};
use section_composer::telemetry;

mod cmd;

#[derive(Parser)]
#[command(name = "section-composer")]
#[command(version, about = "Compose a homepage from configurable sections")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (API, live feed and composed homepage)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the SQLite database
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Permissive CORS for a separately served admin UI
        #[arg(long)]
        dev: bool,

        /// Open the homepage in a browser
        #[arg(long)]
        open: bool,
    },
    /// Create .composer/ with a default composer.toml and database
    Init {
        /// Seed one section per catalog kind when the store is empty
        #[arg(long)]
        seed: bool,
    },
    /// Inspect and edit the local section store
    Sections {
        #[command(subcommand)]
        command: SectionsCommands,
    },
    /// Mutate sections on a running server, queueing changes it can't receive
    Remote {
        /// Server URL (defaults to remote.url or the local server)
        #[arg(long, global = true)]
        url: Option<String>,

        #[command(subcommand)]
        command: RemoteCommands,
    },
    /// Inspect or replay the offline mutation queue
    Queue {
        #[arg(long, global = true)]
        url: Option<String>,

        #[command(subcommand)]
        command: Option<QueueCommands>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum SectionsCommands {
    /// List sections in page order
    List,
    /// List the section kinds that can be added
    Catalog,
    /// Print the composed homepage
    Render {
        /// Print the composed page as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },
    /// Add a section of the given kind (e.g. HeroSection or hero)
    Add {
        component: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        disabled: bool,
    },
    /// Show or hide a section
    Toggle { id: String },
    /// Set config fields, coerced by the section's field types
    Set {
        id: String,
        #[arg(required = true, value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },
    /// Delete a section
    Remove { id: String },
    /// Replace all sections with the default list
    Reset,
    /// Renumber order values to 0..n
    Normalize,
}

#[derive(Subcommand, Clone)]
pub enum RemoteCommands {
    /// List sections on the server
    List,
    /// Add a section; the id is fixed up front so a retried add cannot duplicate it
    Add {
        component: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        disabled: bool,
    },
    /// Show or hide a section. Without --on/--off the current state is read
    /// from the server and flipped.
    Toggle {
        id: String,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    Rename {
        id: String,
        name: String,
    },
    Set {
        id: String,
        #[arg(required = true, value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },
    /// Give the listed sections orders 0..n in argument order
    Reorder {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum QueueCommands {
    /// Show pending mutations
    Status,
    /// Replay pending mutations against the server
    Flush,
    /// Discard all pending mutations
    Clear,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration
    Validate,
    /// Create a default composer.toml
    Init,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            verbose: self.verbose,
            log_json: self.log_json,
            ..CliOverrides::default()
        };
        match &self.command {
            Commands::Serve {
                port, db_path, dev, ..
            } => {
                overrides.port = *port;
                overrides.db_path = db_path.clone();
                overrides.dev_mode = *dev;
            }
            Commands::Remote { url, .. } | Commands::Queue { url, .. } => {
                overrides.remote_url = url.clone();
            }
            _ => {}
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = ComposerConfig::new(project_dir)?.with_cli(cli.overrides());
    telemetry::init_tracing(&config.log_filter(), config.log_json());

    match cli.command {
        Commands::Serve { open, .. } => cmd::cmd_serve(&config, open).await?,
        Commands::Init { seed } => cmd::cmd_init(&config, seed)?,
        Commands::Sections { command } => cmd::cmd_sections(&config, command)?,
        Commands::Remote { command, .. } => cmd::cmd_remote(&config, command).await?,
        Commands::Queue { command, .. } => cmd::cmd_queue(&config, command).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command)?,
    }

    Ok(())
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
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("title=Hello=World").unwrap(),
            ("title".to_string(), "Hello=World".to_string())
        );
        assert_eq!(
            parse_key_val("subtitle=").unwrap(),
            ("subtitle".to_string(), String::new())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_overrides_follow_subcommand() {
        let cli = Cli::parse_from(["section-composer", "serve", "--port", "9000", "--dev"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(9000));
        assert!(overrides.dev_mode);

        let cli = Cli::parse_from([
            "section-composer",
            "remote",
            "toggle",
            "hero",
            "--off",
            "--url",
            "http://cms.test",
        ]);
        assert_eq!(cli.overrides().remote_url.as_deref(), Some("http://cms.test"));
    }

    #[test]
    fn test_remote_toggle_rejects_both_states() {
        let result = Cli::try_parse_from([
            "section-composer",
            "remote",
            "toggle",
            "hero",
            "--on",
            "--off",
        ]);
        assert!(result.is_err());
    }
}
