use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use super::catalog::SectionKind;
use super::models::*;
use super::schema;
use crate::errors::SectionError;

/// Async-safe handle to the section database.
///
/// Wraps `SectionDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O never
/// ties up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<SectionDb>>,
}

impl DbHandle {
    pub fn new(db: SectionDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R, SectionError>
    where
        F: FnOnce(&SectionDb) -> Result<R, SectionError> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| SectionError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .map_err(SectionError::persistence)?
    }

    /// Acquire the database mutex synchronously. Only for startup, CLI
    /// commands and tests; never from a request handler.
    pub fn lock_sync(&self) -> Result<std::sync::MutexGuard<'_, SectionDb>, SectionError> {
        self.inner.lock().map_err(|_| SectionError::LockPoisoned)
    }
}

const SECTION_COLUMNS: &str =
    "id, name, component, enabled, config, sort_order, author_id, created_at, updated_at";

struct SectionRow {
    id: String,
    name: String,
    component: String,
    enabled: bool,
    config: String,
    order: i64,
    author_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SectionRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            component: row.get(2)?,
            enabled: row.get(3)?,
            config: row.get(4)?,
            order: row.get(5)?,
            author_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_section(self) -> Result<SectionInstance, SectionError> {
        let config: ConfigMap = serde_json::from_str(&self.config)?;
        Ok(SectionInstance {
            id: self.id,
            name: self.name,
            component: self.component,
            enabled: self.enabled,
            config,
            order: self.order,
            author_id: self.author_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct SectionDb {
    conn: Connection,
}

impl SectionDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self, SectionError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self, SectionError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<(), SectionError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.run_migrations()
    }

    fn run_migrations(&self) -> Result<(), SectionError> {
        // `seq` records insertion order and breaks ties between equal sort_order values.
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS homepage_sections (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                component TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                config TEXT NOT NULL DEFAULT '{}',
                sort_order INTEGER NOT NULL DEFAULT 0,
                author_id TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_sections_order ON homepage_sections(sort_order, seq);
            ",
        )?;
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────

    pub fn list_sections(&self) -> Result<Vec<SectionInstance>, SectionError> {
        let sql = format!(
            "SELECT {} FROM homepage_sections ORDER BY sort_order ASC, seq ASC",
            SECTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], SectionRow::from_row)?;
        let mut sections = Vec::new();
        for row in rows {
            sections.push(row?.into_section()?);
        }
        Ok(sections)
    }

    pub fn get_section(&self, id: &str) -> Result<Option<SectionInstance>, SectionError> {
        let sql = format!(
            "SELECT {} FROM homepage_sections WHERE id = ?1",
            SECTION_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, params![id], SectionRow::from_row)
            .optional()?;
        row.map(SectionRow::into_section).transpose()
    }

    pub fn count_sections(&self) -> Result<i64, SectionError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM homepage_sections", [], |row| row.get(0))?;
        Ok(count)
    }

    fn next_order(&self) -> Result<i64, SectionError> {
        let next = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM homepage_sections",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    pub fn require_section(&self, id: &str) -> Result<SectionInstance, SectionError> {
        self.get_section(id)?
            .ok_or_else(|| SectionError::not_found(id))
    }

    // ── Mutations ─────────────────────────────────────────────────────

    /// Insert a new section. The stored config holds every schema field of the
    /// component, with explicit values taking precedence over defaults.
    pub fn create_section(&self, new: NewSection) -> Result<SectionInstance, SectionError> {
        let kind = SectionKind::from_str(&new.component)?;

        let id = match new.id {
            Some(id) => {
                let id = id.trim().to_string();
                if id.is_empty() {
                    return Err(SectionError::Validation("Section id must not be empty".into()));
                }
                if self.get_section(&id)?.is_some() {
                    return Err(SectionError::Validation(format!(
                        "Section id '{}' already exists",
                        id
                    )));
                }
                id
            }
            None => format!("{}-{}", kind.catalog_id(), Uuid::new_v4().simple()),
        };
        let name = new
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| kind.display_name().to_string());
        let order = match new.order {
            Some(order) => order,
            None => self.next_order()?,
        };
        let config = schema::effective_config(kind, &new.config);
        let config_json = serde_json::to_string(&config)?;

        self.conn.execute(
            "INSERT INTO homepage_sections (id, name, component, enabled, config, sort_order, author_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                name,
                kind.component_ref(),
                new.enabled.unwrap_or(true),
                config_json,
                order,
                new.author_id
            ],
        )?;
        debug!(section_id = %id, component = %kind, order, "section created");
        self.require_section(&id)
    }

    /// Apply a partial update. `config` is shallow-merged; switching
    /// `component` seeds any schema fields the new kind adds.
    pub fn update_section(
        &self,
        id: &str,
        patch: SectionPatch,
    ) -> Result<SectionInstance, SectionError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut section = self.require_section(id)?;

        if let Some(component) = patch.component {
            let kind = SectionKind::from_str(&component)?;
            section.component = kind.component_ref().to_string();
            section.config = schema::effective_config(kind, &section.config);
        }
        if let Some(name) = patch.name {
            section.name = if name.trim().is_empty() {
                SectionKind::from_str(&section.component)?
                    .display_name()
                    .to_string()
            } else {
                name
            };
        }
        if let Some(enabled) = patch.enabled {
            section.enabled = enabled;
        }
        if let Some(order) = patch.order {
            section.order = order;
        }
        if let Some(edits) = patch.config {
            merge_config(&mut section.config, edits);
        }

        let config_json = serde_json::to_string(&section.config)?;
        tx.execute(
            "UPDATE homepage_sections
             SET name = ?1, component = ?2, enabled = ?3, config = ?4, sort_order = ?5,
                 updated_at = datetime('now')
             WHERE id = ?6",
            params![
                section.name,
                section.component,
                section.enabled,
                config_json,
                section.order,
                id
            ],
        )?;
        tx.commit()?;
        self.require_section(id)
    }

    pub fn toggle_section(&self, id: &str) -> Result<SectionInstance, SectionError> {
        let changed = self.conn.execute(
            "UPDATE homepage_sections SET enabled = NOT enabled, updated_at = datetime('now') WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Err(SectionError::not_found(id));
        }
        self.require_section(id)
    }

    /// Shallow-merge `edits` into the stored config and return the result.
    pub fn merge_config(&self, id: &str, edits: ConfigMap) -> Result<ConfigMap, SectionError> {
        let patch = SectionPatch {
            config: Some(edits),
            ..SectionPatch::default()
        };
        self.update_section(id, patch).map(|section| section.config)
    }

    /// Remove a section and return it. Remaining order values are left as-is.
    pub fn delete_section(&self, id: &str) -> Result<SectionInstance, SectionError> {
        let section = self.require_section(id)?;
        self.conn
            .execute("DELETE FROM homepage_sections WHERE id = ?1", params![id])?;
        debug!(section_id = %id, "section deleted");
        Ok(section)
    }

    /// Apply every `{id, order}` pair in one transaction. An unknown id rolls
    /// back the whole batch.
    pub fn reorder_sections(&self, updates: &[OrderUpdate]) -> Result<(), SectionError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE homepage_sections SET sort_order = ?1, updated_at = datetime('now') WHERE id = ?2",
            )?;
            for update in updates {
                let changed = stmt.execute(params![update.order, update.id])?;
                if changed == 0 {
                    return Err(SectionError::not_found(&update.id));
                }
            }
        }
        tx.commit()?;
        debug!(count = updates.len(), "sections reordered");
        Ok(())
    }

    /// Rewrite order values to `0..n` following the current list order.
    pub fn normalize_order(&self) -> Result<Vec<SectionInstance>, SectionError> {
        let sections = self.list_sections()?;
        let updates: Vec<OrderUpdate> = sections
            .iter()
            .enumerate()
            .map(|(position, section)| OrderUpdate {
                id: section.id.clone(),
                order: position as i64,
            })
            .collect();
        self.reorder_sections(&updates)?;
        self.list_sections()
    }

    /// Replace the whole list with one enabled section per catalog kind.
    pub fn reset_to_defaults(&self) -> Result<Vec<SectionInstance>, SectionError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM homepage_sections", [])?;
        for (position, kind) in SectionKind::ALL.into_iter().enumerate() {
            self.create_section(NewSection {
                id: Some(kind.catalog_id().to_string()),
                order: Some(position as i64),
                ..NewSection::of(kind.component_ref())
            })?;
        }
        tx.commit()?;
        self.list_sections()
    }
}
