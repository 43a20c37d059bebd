//! Record store abstraction.
//!
//! The store behaves like a paged key-value table: a scan returns one page
//! plus a continuation token, and callers keep scanning until the token is
//! gone. [`scan_all`] is the only place that loop lives.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::EndpointRecord;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn RecordStore>;

/// Predicate applied while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanFilter {
    #[default]
    All,
    ActiveOnly,
}

impl ScanFilter {
    pub fn matches(self, record: &EndpointRecord) -> bool {
        match self {
            ScanFilter::All => true,
            ScanFilter::ActiveOnly => record.is_active,
        }
    }
}

/// One page of a scan. `next` is the continuation token; a page may be
/// empty while `next` is still set.
#[derive(Debug, Default)]
pub struct ScanPage {
    pub records: Vec<EndpointRecord>,
    pub next: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record.
    async fn put(&self, record: &EndpointRecord) -> Result<(), StoreError>;

    /// Read one page of records in id order, starting after `start_after`.
    async fn scan_page(
        &self,
        filter: ScanFilter,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<ScanPage, StoreError>;

    /// Set `is_active` on the record with `id`. Unknown ids are a no-op.
    async fn set_active(&self, id: &str, is_active: bool) -> Result<(), StoreError>;
}

/// Scan every page and aggregate the full result set.
pub async fn scan_all(
    store: &dyn RecordStore,
    filter: ScanFilter,
    page_size: usize,
) -> Result<Vec<EndpointRecord>, StoreError> {
    // ---
    let page_size = page_size.max(1);
    let mut all_records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_count = 0;

    loop {
        page_count += 1;
        let page = store.scan_page(filter, cursor.as_deref(), page_size).await?;

        tracing::debug!(
            "Scan page {} returned {} records, next: {:?}",
            page_count,
            page.records.len(),
            page.next
        );

        all_records.extend(page.records);
        cursor = page.next;

        if cursor.is_none() {
            break;
        }
    }

    tracing::debug!(
        "Finished scan ({:?}): {} records from {} pages",
        filter,
        all_records.len(),
        page_count
    );
    Ok(all_records)
}
