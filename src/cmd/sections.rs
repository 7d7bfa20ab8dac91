//! Local store commands: `section-composer sections`.

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use section_composer::config::ComposerConfig;
use section_composer::sections::catalog;
use section_composer::sections::compose::RendererRegistry;
use section_composer::sections::db::SectionDb;
use section_composer::sections::editor;
use section_composer::sections::models::{NewSection, SectionInstance};

use super::super::SectionsCommands;

/// Open (creating if needed) the database named by the config.
pub fn open_store(config: &ComposerConfig) -> Result<SectionDb> {
    let path = config.db_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    SectionDb::new(&path)
        .with_context(|| format!("Failed to open section database at {}", path.display()))
}

pub fn print_sections(sections: &[SectionInstance]) {
    if sections.is_empty() {
        println!("No sections. Run `section-composer init --seed` to add the defaults.");
        return;
    }
    for section in sections {
        let state = if section.enabled {
            console::style("on ").green()
        } else {
            console::style("off").dim()
        };
        println!(
            "{:>3}  {}  {:<24} {:<16} {}",
            section.order,
            state,
            section.id,
            section.component,
            console::style(&section.name).dim()
        );
    }
}

pub fn cmd_sections(config: &ComposerConfig, command: SectionsCommands) -> Result<()> {
    let db = open_store(config)?;

    match command {
        SectionsCommands::List => print_sections(&db.list_sections()?),
        SectionsCommands::Catalog => {
            for definition in catalog::catalog() {
                println!(
                    "{:<10} {:<16} {}",
                    definition.id, definition.component_ref, definition.display_name
                );
            }
        }
        SectionsCommands::Render { json } => {
            let page = RendererRegistry::builtin().compose(&db.list_sections()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                println!("{}", page.to_html());
            }
            if !page.skipped.is_empty() {
                eprintln!(
                    "{} no renderer for: {}",
                    console::style("Skipped").yellow(),
                    page.skipped.join(", ")
                );
            }
        }
        SectionsCommands::Add {
            component,
            name,
            disabled,
        } => {
            let section = db.create_section(NewSection {
                name,
                enabled: Some(!disabled),
                ..NewSection::of(component)
            })?;
            println!(
                "Added {} ({}) at position {}",
                section.id, section.component, section.order
            );
        }
        SectionsCommands::Toggle { id } => {
            let section = db.toggle_section(&id)?;
            let state = if section.enabled { "enabled" } else { "disabled" };
            println!("Section {} {}", section.id, state);
        }
        SectionsCommands::Set { id, fields } => {
            let raw: BTreeMap<String, String> = fields.into_iter().collect();
            let config = editor::save_form(&db, &id, &raw)?;
            println!("Updated {}:", id);
            for key in raw.keys() {
                if let Some(value) = config.get(key) {
                    println!("  {} = {}", key, value);
                }
            }
        }
        SectionsCommands::Remove { id } => {
            let section = db.delete_section(&id)?;
            println!("Removed {} ({})", section.id, section.component);
        }
        SectionsCommands::Reset => {
            let sections = db.reset_to_defaults()?;
            println!("Reset to {} default sections.", sections.len());
        }
        SectionsCommands::Normalize => {
            let sections = db.normalize_order()?;
            println!("Renumbered {} sections.", sections.len());
        }
    }

    Ok(())
}
