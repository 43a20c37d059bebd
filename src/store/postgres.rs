use async_trait::async_trait;
use sqlx::PgPool;

use super::{RecordStore, ScanFilter, ScanPage};
use crate::error::StoreError;
use crate::models::EndpointRecord;

// ---

/// PostgreSQL-backed record store. Paging is keyset-based on `id`; the
/// continuation token is the last id of a full page.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    table: String,
}

impl PgStore {
    /// `table` must already be validated by the config loader.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn put(&self, record: &EndpointRecord) -> Result<(), StoreError> {
        // ---
        let sql = format!(
            r#"INSERT INTO "{}" (id, target_url, is_active, created_at) VALUES ($1, $2, $3, $4)"#,
            self.table
        );

        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.target_url)
            .bind(record.is_active)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn scan_page(
        &self,
        filter: ScanFilter,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<ScanPage, StoreError> {
        // ---
        let sql = format!(
            r#"
            SELECT id, target_url, is_active, created_at
            FROM "{}"
            WHERE ($1::TEXT IS NULL OR id > $1)
              AND ($2 = FALSE OR is_active)
            ORDER BY id
            LIMIT $3
            "#,
            self.table
        );

        let records: Vec<EndpointRecord> = sqlx::query_as(&sql)
            .bind(start_after)
            .bind(filter == ScanFilter::ActiveOnly)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let next = if records.len() == limit {
            records.last().map(|r| r.id.clone())
        } else {
            None
        };

        Ok(ScanPage { records, next })
    }

    async fn set_active(&self, id: &str, is_active: bool) -> Result<(), StoreError> {
        // ---
        let sql = format!(r#"UPDATE "{}" SET is_active = $1 WHERE id = $2"#, self.table);

        let result = sqlx::query(&sql)
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("Update of unknown id {} matched no rows", id);
        }
        Ok(())
    }
}
