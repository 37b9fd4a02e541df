//! Field-hash catalog maintenance and error enhancement.

use std::collections::BTreeMap;

use docstore_common::error::{StoreError, StoreResult};
use docstore_common::{find_hashed_columns, FieldPath, Ident, TableName, Value};
use tracing::{debug, info, warn};

use super::Session;
use crate::backend::Backend;
use crate::catalog::{self, FieldMapping};

impl Session {
    /// Registers field paths in the catalog without creating indexes.
    ///
    /// Every table name and field path is validated before anything is
    /// written. Tables that do not exist are skipped with a warning. Returns
    /// the number of catalog rows written.
    pub async fn setup_field_hash_mappings(
        &self,
        mappings: &BTreeMap<String, Vec<String>>,
    ) -> StoreResult<usize> {
        let backend = self.backend("setupFieldHashMappings")?;

        let mut parsed = Vec::with_capacity(mappings.len());
        for (table, fields) in mappings {
            let table = TableName::parse(table)?;
            let fields = fields
                .iter()
                .map(|f| FieldPath::parse(f))
                .collect::<StoreResult<Vec<_>>>()?;
            parsed.push((table, fields));
        }

        let mut written = 0;
        for (table, fields) in parsed {
            if !self.table_exists(backend.as_ref(), &table).await? {
                warn!("Skipping field mappings for missing table {}", table.as_str());
                continue;
            }
            for field in &fields {
                self.upsert_mapping(backend.as_ref(), &table, field).await?;
                written += 1;
            }
        }

        info!("Registered {} field mappings", written);
        Ok(written)
    }

    /// Returns the catalog rows registered for `table`, ordered by field name.
    pub async fn field_mappings(&self, table: &str) -> StoreResult<Vec<FieldMapping>> {
        let backend = self.backend("fieldMappings")?;
        let table = TableName::parse(table)?;

        let rows = self
            .query(
                backend.as_ref(),
                &catalog::mappings_sql(),
                vec![table.as_str().into()],
            )
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(FieldMapping {
                    field_hash: row.get_str("fieldHash")?.to_string(),
                    table_name: row.get_str("tableName")?.to_string(),
                    field_name: row.get_str("fieldName")?.to_string(),
                })
            })
            .collect())
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    pub(crate) async fn upsert_mapping(
        &self,
        backend: &dyn Backend,
        table: &TableName,
        field: &FieldPath,
    ) -> StoreResult<()> {
        let params = vec![
            field.hashed_column().as_str().into(),
            table.as_str().into(),
            field.as_str().into(),
        ];
        self.execute(backend, &catalog::upsert_sql(), params).await?;
        Ok(())
    }

    /// Resolves hashed column names to field paths for `table`.
    ///
    /// Hashes the catalog does not know are absent from the result.
    pub(crate) async fn lookup_fields(
        &self,
        backend: &dyn Backend,
        table: &TableName,
        hashes: &[String],
    ) -> StoreResult<Vec<(String, String)>> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let mut params: Vec<Value> = Vec::with_capacity(hashes.len() + 1);
        params.push(table.as_str().into());
        params.extend(hashes.iter().map(|h| Value::String(h.clone())));

        let rows = self
            .query(backend, &catalog::lookup_sql(hashes.len()), params)
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                Some((
                    row.get_str("fieldHash")?.to_string(),
                    row.get_str("fieldName")?.to_string(),
                ))
            })
            .collect())
    }

    /// Rewrites hashed column names in an engine error into field names.
    ///
    /// Non-engine errors and messages without hashed names pass through. A
    /// failed catalog lookup returns the original error.
    pub(crate) async fn enhance_error(
        &self,
        backend: &dyn Backend,
        table: &TableName,
        err: StoreError,
    ) -> StoreError {
        let hashes = match &err {
            StoreError::Engine { message, .. } => find_hashed_columns(message),
            _ => return err,
        };
        if hashes.is_empty() {
            return err;
        }

        match self.lookup_fields(backend, table, &hashes).await {
            Ok(mappings) if !mappings.is_empty() => {
                err.map_engine_message(|m| catalog::rewrite_message(&m, &mappings))
            }
            Ok(_) => err,
            Err(lookup_err) => {
                debug!("Catalog lookup failed during error enhancement: {}", lookup_err);
                err
            }
        }
    }

    async fn table_exists(&self, backend: &dyn Backend, table: &TableName) -> StoreResult<bool> {
        let database = table.database().map(Ident::as_str);
        let params = vec![Value::from(database), table.table().as_str().into()];
        let rows = self
            .query(
                backend,
                "SELECT COUNT(*) AS n FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?",
                params,
            )
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.get_i64("n"))
            .is_some_and(|n| n > 0))
    }
}
