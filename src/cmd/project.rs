//! Project setup command: `section-composer init`.

use anyhow::{Context, Result};

use section_composer::config::{ComposerConfig, ComposerToml};

use super::sections::open_store;

pub fn cmd_init(config: &ComposerConfig, seed: bool) -> Result<()> {
    let was_initialized = config.config_file().exists();

    std::fs::create_dir_all(&config.composer_dir).with_context(|| {
        format!("Failed to create {}", config.composer_dir.display())
    })?;
    if !was_initialized {
        ComposerToml::default().save(&config.config_file())?;
    }

    let db = open_store(config)?;

    if was_initialized {
        println!(
            "Section composer already initialized at {}",
            config.composer_dir.display()
        );
    } else {
        println!(
            "Initialized section composer at {}",
            config.composer_dir.display()
        );
        println!();
        println!("Created:");
        println!("  .composer/");
        println!("  ├── composer.toml  # Server, auth and logging settings");
        println!("  └── {}", config.toml.database.path.display());
    }

    if seed {
        let existing = db.count_sections()?;
        if existing == 0 {
            let sections = db.reset_to_defaults()?;
            println!("Seeded {} default sections.", sections.len());
        } else {
            println!("Store already holds {} sections, skipping seed.", existing);
        }
    }

    if !was_initialized {
        println!();
        println!("Next steps:");
        println!("  1. Set auth.admin_token in .composer/composer.toml");
        println!("  2. Run `section-composer serve` and open the homepage");
    }

    Ok(())
}
