//! Filter queries over JSON documents.

use std::collections::HashSet;

use docstore_common::error::StoreResult;
use docstore_common::{Ident, TableName};
use docstore_query::{scan_predicates, Fragment, SplitFilter};
use serde_json::Value as JsonValue;

use super::{decode_document, Session};
use crate::backend::Backend;

impl Session {
    /// Returns every document whose fields equal all values in `filter`.
    ///
    /// `filter` must be a non-empty object whose keys are field paths. Each
    /// key becomes a JSON-extraction predicate, so no index is used. No
    /// match is an empty result.
    pub async fn get_from_non_index(
        &self,
        table: &str,
        json_col: &str,
        filter: &JsonValue,
    ) -> StoreResult<Vec<JsonValue>> {
        let backend = self.backend("getFromNonIndex")?;
        let table = TableName::parse(table)?;
        let json = Ident::new(json_col, "jsonCol")?;
        let predicates = scan_predicates(&json, filter)?;

        self.select_documents(backend.as_ref(), &table, &json, predicates)
            .await
    }

    /// Like [`Session::get_from_non_index`], but fields with an index on the
    /// table compare against their generated column.
    pub async fn find(
        &self,
        table: &str,
        json_col: &str,
        filter: &JsonValue,
    ) -> StoreResult<Vec<JsonValue>> {
        let backend = self.backend("find")?;
        let table = TableName::parse(table)?;
        let json = Ident::new(json_col, "jsonCol")?;
        // validate before touching the engine
        docstore_query::validate_filter(filter)?;

        let rows = self
            .query(backend.as_ref(), &format!("SHOW INDEX FROM {table}"), Vec::new())
            .await?;
        let indexed: HashSet<String> = rows
            .iter()
            .filter_map(|row| row.get_str("Column_name").map(str::to_string))
            .collect();

        let split = SplitFilter::plan(&json, filter, |col| indexed.contains(col.as_str()))?;
        self.select_documents(backend.as_ref(), &table, &json, split.into_where())
            .await
    }

    async fn select_documents(
        &self,
        backend: &dyn Backend,
        table: &TableName,
        json: &Ident,
        predicates: Fragment,
    ) -> StoreResult<Vec<JsonValue>> {
        let sql = format!("SELECT {json} FROM {table} WHERE {}", predicates.sql);

        let rows = match self.query(backend, &sql, predicates.params).await {
            Ok(rows) => rows,
            Err(err) => return Err(self.enhance_error(backend, table, err).await),
        };

        rows.iter()
            .filter_map(|row| row.get_index(0))
            .map(decode_document)
            .collect()
    }
}
