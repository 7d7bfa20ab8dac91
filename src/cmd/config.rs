//! Configuration view and validation commands: `section-composer config`.

use anyhow::Result;

use section_composer::config::{ComposerConfig, ComposerToml};

use super::super::ConfigCommands;

fn mask(token: Option<&str>) -> String {
    match token {
        Some(_) => "\"********\"".to_string(),
        None => "(unset)".to_string(),
    }
}

pub fn cmd_config(config: &ComposerConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Section Composer Configuration");
            println!("==============================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No composer.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[server]");
            println!("  port = {}", toml.server.port);
            println!("  host = \"{}\"", toml.server.host);
            println!("  dev_mode = {}", toml.server.dev_mode);
            println!("  site_title = \"{}\"", toml.server.site_title);
            println!();
            println!("[database]");
            println!("  path = \"{}\"", toml.database.path.display());
            println!();
            println!("[auth]");
            println!("  admin_token = {}", mask(toml.auth.admin_token.as_deref()));
            println!();
            println!("[logging]");
            println!("  filter = \"{}\"", toml.logging.filter);
            println!("  json = {}", toml.logging.json);
            println!();
            println!("[remote]");
            match &toml.remote.url {
                Some(url) => println!("  url = \"{}\"", url),
                None => println!("  url = (unset)"),
            }
            println!("  token = {}", mask(toml.remote.token.as_deref()));
            println!("  queue_file = \"{}\"", toml.remote.queue_file.display());
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  listen = {}:{}", config.host(), config.port());
            println!("  db_path = {}", config.db_path().display());
            println!("  admin_token = {}", mask(config.admin_token().as_deref()));
            println!("  remote_url = {}", config.remote_url());
            println!("  queue = {}", config.queue_path().display());
            println!("  log_filter = {}", config.log_filter());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("composer.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config.composer_dir)?;
            ComposerToml::default().save(&config_path)?;

            println!("Created composer.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] port, host, site_title");
            println!("  - [auth] admin_token for admin routes");
            println!("  - [remote] url and token for `remote` commands");
            println!();
        }
    }

    Ok(())
}
