//! Database-backed [`ExistenceCheck`] for foreign-key validation rules.

use std::collections::HashSet;

use async_trait::async_trait;
use catalog_core::types::DbId;
use catalog_core::validation::{ExistenceCheck, LiveTable};
use sqlx::PgPool;

use crate::upsert::UpsertError;

/// Answers `exists` rules against live rows of the pool's tables.
pub struct LiveRows<'a>(pub &'a PgPool);

#[async_trait]
impl ExistenceCheck for LiveRows<'_> {
    type Error = UpsertError;

    async fn live_ids(
        &self,
        table: LiveTable,
        ids: &[DbId],
    ) -> Result<HashSet<DbId>, UpsertError> {
        let query = format!(
            "SELECT id FROM {} WHERE id = ANY($1) AND deleted_at IS NULL",
            table.table_name()
        );
        let found = sqlx::query_scalar::<_, DbId>(&query)
            .bind(ids)
            .fetch_all(self.0)
            .await?;
        Ok(found.into_iter().collect())
    }
}
