//! Document CRUD by primary key.

use docstore_common::error::{StoreError, StoreResult};
use docstore_common::validate::{is_valid_json_value, is_valid_primary_key};
use docstore_common::{Ident, TableName};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::{decode_document, Session};

/// First line of every failed `put`.
pub(crate) const WRITE_FAILURE_PREFIX: &str = "Exception occurred while writing to database";

/// Validated arguments shared by the keyed operations.
struct KeyedTarget {
    table: TableName,
    pk_col: Ident,
    pk_value: String,
}

impl KeyedTarget {
    fn parse(table: &str, pk_col: &str, pk_value: &str) -> StoreResult<Self> {
        let table = TableName::parse(table)?;
        let pk_col = Ident::new(pk_col, "primaryKeyCol")?;
        if !is_valid_primary_key(pk_value) {
            return Err(StoreError::invalid_argument("primaryKeyValue"));
        }
        Ok(Self {
            table,
            pk_col,
            pk_value: pk_value.to_string(),
        })
    }
}

impl Session {
    /// Inserts or replaces the document stored under `pk_value`.
    ///
    /// Engine failures keep their native code; the message gains the
    /// `Exception occurred while writing to database` first line and hashed
    /// column names are replaced by field names where the catalog knows them.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        table: &str,
        pk_col: &str,
        pk_value: &str,
        json_col: &str,
        value: &T,
    ) -> StoreResult<()> {
        let backend = self.backend("put")?;
        let target = KeyedTarget::parse(table, pk_col, pk_value)?;
        let json = Ident::new(json_col, "jsonCol")?;

        let document =
            serde_json::to_value(value).map_err(|_| StoreError::invalid_argument("jsonValue"))?;
        if !is_valid_json_value(&document) {
            return Err(StoreError::invalid_argument("jsonValue"));
        }
        let text = document.to_string();

        let sql = format!(
            "INSERT INTO {} ({}, {json}) VALUES (?, ?) ON DUPLICATE KEY UPDATE {json} = VALUES({json})",
            target.table, target.pk_col
        );
        let params = vec![target.pk_value.clone().into(), text.into()];

        match self.execute(backend.as_ref(), &sql, params).await {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = self
                    .enhance_error(backend.as_ref(), &target.table, err)
                    .await;
                Err(err.map_engine_message(|m| format!("{WRITE_FAILURE_PREFIX}\n{m}")))
            }
        }
    }

    /// Returns the document stored under `pk_value`, or `None`.
    ///
    /// A missing table surfaces the engine error unchanged.
    pub async fn get(
        &self,
        table: &str,
        pk_col: &str,
        pk_value: &str,
        json_col: &str,
    ) -> StoreResult<Option<JsonValue>> {
        let backend = self.backend("get")?;
        let target = KeyedTarget::parse(table, pk_col, pk_value)?;
        let json = Ident::new(json_col, "jsonCol")?;

        let sql = format!(
            "SELECT {json} FROM {} WHERE {} = ?",
            target.table, target.pk_col
        );
        let rows = self
            .query(backend.as_ref(), &sql, vec![target.pk_value.into()])
            .await?;

        rows.first()
            .and_then(|row| row.get_index(0))
            .map(decode_document)
            .transpose()
    }

    /// Like [`Session::get`], deserializing into `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        table: &str,
        pk_col: &str,
        pk_value: &str,
        json_col: &str,
    ) -> StoreResult<Option<T>> {
        match self.get(table, pk_col, pk_value, json_col).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Deletes the document stored under `pk_value`. Deleting an absent key
    /// succeeds.
    pub async fn delete_key(&self, table: &str, pk_col: &str, pk_value: &str) -> StoreResult<()> {
        let backend = self.backend("deleteKey")?;
        let target = KeyedTarget::parse(table, pk_col, pk_value)?;

        let sql = format!("DELETE FROM {} WHERE {} = ?", target.table, target.pk_col);
        self.execute(backend.as_ref(), &sql, vec![target.pk_value.into()])
            .await?;
        Ok(())
    }
}
