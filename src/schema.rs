//! Database schema management for `endpoint-checker`.
//!
//! Ensures the record table exists before serving requests.
//! Applied once on startup from `main.rs`, postgres backend only.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the endpoint record table (idempotent).
///
/// One flat table keyed by `id`. There is deliberately no index on
/// `is_active`; the checker filters during the scan. Safe to call on every
/// startup; no-op if the table already exists.
///
/// `table` must already be validated by the config loader.
pub async fn create_schema(pool: &PgPool, table: &str) -> Result<()> {
    // ---
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{table}" (
            id          TEXT    PRIMARY KEY,
            target_url  TEXT    NOT NULL,
            is_active   BOOLEAN NOT NULL DEFAULT TRUE,
            created_at  BIGINT  NOT NULL
        );
        "#
    );

    sqlx::query(&sql).execute(pool).await?;

    tracing::info!("Schema ready for table {}", table);
    Ok(())
}
