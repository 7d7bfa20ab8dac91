//! Remote server and offline queue commands: `section-composer remote|queue`.

use anyhow::{Context, Result};

use section_composer::config::ComposerConfig;
use section_composer::sections::client::RemoteStore;
use section_composer::sections::models::{NewSection, OrderUpdate, SectionPatch};
use section_composer::sections::offline::{Mutation, OfflineQueue, QueuedWriter, WriteOutcome};

use super::super::{QueueCommands, RemoteCommands};
use super::sections::print_sections;

fn remote_store(config: &ComposerConfig) -> Result<RemoteStore> {
    let url = config.remote_url();
    RemoteStore::new(&url, config.remote_token())
        .with_context(|| format!("Failed to create client for {}", url))
}

fn open_queue(config: &ComposerConfig) -> Result<OfflineQueue> {
    let path = config.queue_path();
    OfflineQueue::open(&path)
        .with_context(|| format!("Failed to read offline queue at {}", path.display()))
}

pub async fn cmd_remote(config: &ComposerConfig, command: RemoteCommands) -> Result<()> {
    let store = remote_store(config)?;

    let mutation = match command {
        RemoteCommands::List => {
            print_sections(&store.list_sections().await?);
            return Ok(());
        }
        RemoteCommands::Add {
            component,
            name,
            disabled,
        } => Mutation::Create {
            section: NewSection {
                name,
                enabled: Some(!disabled),
                ..NewSection::of(component)
            },
        },
        RemoteCommands::Toggle { id, on, off } => {
            let enabled = match (on, off) {
                (true, _) => true,
                (_, true) => false,
                _ => {
                    let current = store.get_section(&id).await.with_context(|| {
                        format!(
                            "Failed to read {} from {}; pass --on or --off to queue the change",
                            id,
                            store.base_url()
                        )
                    })?;
                    !current.enabled
                }
            };
            Mutation::set_enabled(id, enabled)
        }
        RemoteCommands::Rename { id, name } => Mutation::Update {
            id,
            patch: SectionPatch {
                name: Some(name),
                ..SectionPatch::default()
            },
        },
        RemoteCommands::Set { id, fields } => Mutation::SaveForm {
            id,
            fields: fields.into_iter().collect(),
        },
        RemoteCommands::Reorder { ids } => Mutation::Reorder {
            updates: ids
                .into_iter()
                .enumerate()
                .map(|(order, id)| OrderUpdate {
                    id,
                    order: order as i64,
                })
                .collect(),
        },
        RemoteCommands::Delete { id } => Mutation::Delete { id },
    };

    let mutation = mutation.with_stable_id();
    let description = mutation.describe();
    let mut writer = QueuedWriter::new(store, open_queue(config)?);
    match writer.submit(mutation).await? {
        WriteOutcome::Applied => {
            println!("{} {}", console::style("Applied").green(), description);
        }
        WriteOutcome::Queued { pending, .. } => {
            println!(
                "{} {} ({} pending). Run `section-composer queue flush` once {} is reachable.",
                console::style("Queued").yellow(),
                description,
                pending,
                config.remote_url()
            );
        }
    }
    Ok(())
}

pub async fn cmd_queue(config: &ComposerConfig, command: Option<QueueCommands>) -> Result<()> {
    let mut queue = open_queue(config)?;

    match command {
        None | Some(QueueCommands::Status) => {
            if queue.is_empty() {
                println!("No pending mutations.");
                return Ok(());
            }
            println!(
                "{} pending mutation(s) in {}:",
                queue.len(),
                queue.path().display()
            );
            for entry in queue.pending() {
                println!(
                    "  {}  {:<32} attempts: {}",
                    entry.queued_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.mutation.describe(),
                    entry.attempts
                );
            }
        }
        Some(QueueCommands::Flush) => {
            if queue.is_empty() {
                println!("No pending mutations.");
                return Ok(());
            }
            let store = remote_store(config)?;
            let report = queue.flush(&store).await?;
            for (entry, reason) in &report.dropped {
                println!(
                    "{} {}: {}",
                    console::style("Dropped").red(),
                    entry.mutation.describe(),
                    reason
                );
            }
            println!(
                "Applied {}, dropped {}, {} still pending.",
                report.applied,
                report.dropped.len(),
                report.remaining
            );
        }
        Some(QueueCommands::Clear) => {
            let cleared = queue.clear()?;
            println!("Discarded {} pending mutation(s).", cleared);
        }
    }

    Ok(())
}
