//! Offline mutation queue.
//!
//! Admin changes that cannot reach the store (server down, network gone) are
//! appended to a JSON file instead of being dropped. [`OfflineQueue::flush`]
//! replays them in FIFO order once the store is reachable again:
//!
//! - applied entries are removed;
//! - the first retryable failure stops the flush and keeps the rest queued;
//! - entries the store rejects outright (validation, missing id) are dropped
//!   and reported, since replaying them can never succeed.
//!
//! Every queued mutation is safe to replay after a write whose reply was
//! lost: visibility changes carry the target state rather than a flip, and
//! creates carry an explicit id so a second delivery is rejected instead of
//! duplicating the section.
//!
//! The file is rewritten atomically (temp file + rename) after every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::catalog::SectionKind;
use super::models::{NewSection, OrderUpdate, SectionPatch};
use super::writer::SectionWriter;
use crate::errors::SectionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    Create {
        section: NewSection,
    },
    Update {
        id: String,
        patch: SectionPatch,
    },
    SaveForm {
        id: String,
        fields: BTreeMap<String, String>,
    },
    Delete {
        id: String,
    },
    Reorder {
        updates: Vec<OrderUpdate>,
    },
}

impl Mutation {
    /// Show or hide a section.
    pub fn set_enabled(id: impl Into<String>, enabled: bool) -> Self {
        Self::Update {
            id: id.into(),
            patch: SectionPatch {
                enabled: Some(enabled),
                ..SectionPatch::default()
            },
        }
    }

    /// Give a create without an id the `<catalog id>-<uuid>` id the store
    /// would have generated, so every delivery targets the same record.
    pub fn with_stable_id(self) -> Self {
        match self {
            Self::Create { mut section } if section.id.is_none() => {
                if let Ok(kind) = section.component.parse::<SectionKind>() {
                    section.id = Some(format!("{}-{}", kind.catalog_id(), Uuid::new_v4().simple()));
                }
                Self::Create { section }
            }
            other => other,
        }
    }

    pub async fn apply(&self, writer: &dyn SectionWriter) -> Result<(), SectionError> {
        match self {
            Self::Create { section } => writer.create_section(section.clone()).await.map(drop),
            Self::Update { id, patch } => writer.update_section(id, patch.clone()).await.map(drop),
            Self::SaveForm { id, fields } => writer.save_form(id, fields.clone()).await.map(drop),
            Self::Delete { id } => writer.delete_section(id).await.map(drop),
            Self::Reorder { updates } => writer.reorder_sections(updates.clone()).await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Create { section } => match &section.id {
                Some(id) => format!("create {} ({})", section.component, id),
                None => format!("create {}", section.component),
            },
            Self::Update { id, patch } => match patch.enabled {
                Some(true) if patch.without_enabled().is_empty() => format!("enable {}", id),
                Some(false) if patch.without_enabled().is_empty() => format!("disable {}", id),
                _ => format!("update {}", id),
            },
            Self::SaveForm { id, fields } => format!("edit {} ({} fields)", id, fields.len()),
            Self::Delete { id } => format!("delete {}", id),
            Self::Reorder { updates } => format!("reorder {} sections", updates.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    pub id: Uuid,
    pub queued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    pub mutation: Mutation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    pub applied: usize,
    /// Entries rejected by the store, with the rejection message.
    pub dropped: Vec<(PendingMutation, String)>,
    pub remaining: usize,
}

pub struct OfflineQueue {
    path: PathBuf,
    entries: Vec<PendingMutation>,
}

impl OfflineQueue {
    /// Load the queue stored at `path`; a missing file is an empty queue.
    pub fn open(path: &Path) -> Result<Self, SectionError> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SectionError::persistence)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pending(&self) -> &[PendingMutation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn enqueue(&mut self, mutation: Mutation) -> Result<Uuid, SectionError> {
        let entry = PendingMutation {
            id: Uuid::new_v4(),
            queued_at: Utc::now(),
            attempts: 0,
            mutation: mutation.with_stable_id(),
        };
        let id = entry.id;
        info!(queue_id = %id, op = %entry.mutation.describe(), "mutation queued for later delivery");
        self.entries.push(entry);
        self.persist()?;
        Ok(id)
    }

    /// Drop every pending entry, returning how many were discarded.
    pub fn clear(&mut self) -> Result<usize, SectionError> {
        let count = self.entries.len();
        self.entries.clear();
        self.persist()?;
        Ok(count)
    }

    pub async fn flush(&mut self, writer: &dyn SectionWriter) -> Result<FlushReport, SectionError> {
        let mut report = FlushReport::default();

        while let Some(entry) = self.entries.first() {
            match entry.mutation.apply(writer).await {
                Ok(()) => {
                    debug!(queue_id = %entry.id, "queued mutation applied");
                    self.entries.remove(0);
                    report.applied += 1;
                }
                Err(err) if err.is_retryable() || matches!(err, SectionError::Unauthorized) => {
                    warn!(queue_id = %entry.id, error = %err, "flush stopped, store unreachable");
                    self.entries[0].attempts += 1;
                    break;
                }
                Err(err) => {
                    warn!(queue_id = %entry.id, error = %err, "queued mutation rejected, dropping");
                    let entry = self.entries.remove(0);
                    report.dropped.push((entry, err.to_string()));
                }
            }
            self.persist()?;
        }

        self.persist()?;
        report.remaining = self.entries.len();
        Ok(report)
    }

    fn persist(&self) -> Result<(), SectionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(SectionError::persistence)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(SectionError::persistence)?;
        std::fs::rename(&tmp, &self.path).map_err(SectionError::persistence)?;
        Ok(())
    }
}

/// Result of submitting a mutation through a [`QueuedWriter`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Applied,
    Queued { queue_id: Uuid, pending: usize },
}

/// A writer that never loses a mutation to a transient failure.
///
/// New mutations never overtake queued ones: if older entries cannot be
/// flushed, the new mutation is queued behind them.
pub struct QueuedWriter<W> {
    writer: W,
    queue: OfflineQueue,
}

impl<W: SectionWriter> QueuedWriter<W> {
    pub fn new(writer: W, queue: OfflineQueue) -> Self {
        Self { writer, queue }
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    pub async fn flush(&mut self) -> Result<FlushReport, SectionError> {
        self.queue.flush(&self.writer).await
    }

    pub async fn submit(&mut self, mutation: Mutation) -> Result<WriteOutcome, SectionError> {
        let mutation = mutation.with_stable_id();
        if !self.queue.is_empty() {
            self.queue.flush(&self.writer).await?;
        }
        if self.queue.is_empty() {
            match mutation.apply(&self.writer).await {
                Ok(()) => return Ok(WriteOutcome::Applied),
                Err(err) if err.is_retryable() => {
                    warn!(error = %err, op = %mutation.describe(), "write failed, queueing");
                }
                Err(err) => return Err(err),
            }
        }
        let queue_id = self.queue.enqueue(mutation)?;
        Ok(WriteOutcome::Queued {
            queue_id,
            pending: self.queue.len(),
        })
    }
}
