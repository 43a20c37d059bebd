use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RecordStore, ScanFilter, ScanPage};
use crate::error::StoreError;
use crate::models::EndpointRecord;

// ---

/// In-process record store for local runs and tests.
///
/// Scans behave like a managed key-value table: `limit` bounds the number of
/// records *examined*, the filter is applied afterwards, so a page can come
/// back short or empty while a continuation token is still returned.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, EndpointRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, record: &EndpointRecord) -> Result<(), StoreError> {
        // ---
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn scan_page(
        &self,
        filter: ScanFilter,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<ScanPage, StoreError> {
        // ---
        let records = self.records.read().await;
        let lower = match start_after {
            Some(id) => Bound::Excluded(id.to_string()),
            None => Bound::Unbounded,
        };

        let mut examined = records.range((lower, Bound::Unbounded));
        let mut page = ScanPage::default();
        let mut last_key = None;

        for (key, record) in examined.by_ref().take(limit) {
            last_key = Some(key.clone());
            if filter.matches(record) {
                page.records.push(record.clone());
            }
        }

        if examined.next().is_some() {
            page.next = last_key;
        }
        Ok(page)
    }

    async fn set_active(&self, id: &str, is_active: bool) -> Result<(), StoreError> {
        // ---
        match self.records.write().await.get_mut(id) {
            Some(record) => record.is_active = is_active,
            None => tracing::debug!("Update of unknown id {} ignored", id),
        }
        Ok(())
    }
}
