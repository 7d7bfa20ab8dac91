use std::collections::BTreeMap;

use async_trait::async_trait;

use super::db::DbHandle;
use super::editor;
use super::models::*;
use crate::errors::SectionError;

/// Every mutation the section store accepts that can be replayed safely.
///
/// Implemented by the local [`DbHandle`] and by the HTTP
/// [`RemoteStore`](super::client::RemoteStore); the offline queue replays
/// pending mutations through this trait.
#[async_trait]
pub trait SectionWriter: Send + Sync {
    async fn create_section(&self, new: NewSection) -> Result<SectionInstance, SectionError>;

    async fn update_section(
        &self,
        id: &str,
        patch: SectionPatch,
    ) -> Result<SectionInstance, SectionError>;

    async fn save_form(
        &self,
        id: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<ConfigMap, SectionError>;

    async fn delete_section(&self, id: &str) -> Result<SectionInstance, SectionError>;

    async fn reorder_sections(&self, updates: Vec<OrderUpdate>) -> Result<(), SectionError>;
}

#[async_trait]
impl SectionWriter for DbHandle {
    async fn create_section(&self, new: NewSection) -> Result<SectionInstance, SectionError> {
        self.call(move |db| db.create_section(new)).await
    }

    async fn update_section(
        &self,
        id: &str,
        patch: SectionPatch,
    ) -> Result<SectionInstance, SectionError> {
        let id = id.to_string();
        self.call(move |db| db.update_section(&id, patch)).await
    }

    async fn save_form(
        &self,
        id: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<ConfigMap, SectionError> {
        let id = id.to_string();
        self.call(move |db| editor::save_form(db, &id, &fields)).await
    }

    async fn delete_section(&self, id: &str) -> Result<SectionInstance, SectionError> {
        let id = id.to_string();
        self.call(move |db| db.delete_section(&id)).await
    }

    async fn reorder_sections(&self, updates: Vec<OrderUpdate>) -> Result<(), SectionError> {
        self.call(move |db| db.reorder_sections(&updates)).await
    }
}
