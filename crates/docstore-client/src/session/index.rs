//! Secondary indexes on JSON fields.
//!
//! An index on `address.city` becomes a generated column named
//! `hash_field("address.city")` holding the unquoted extracted value, plus
//! an index of the same name over it. The catalog records the reverse
//! mapping so errors and introspection can show the field path.

use docstore_common::error::{StoreError, StoreResult};
use docstore_common::{ColumnType, FieldPath, Ident, TableName};
use docstore_query::json_extract;
use tracing::{info, warn};

use super::Session;
use crate::backend::Backend;
use crate::catalog;

/// Generated-column type used when none is given.
pub const DEFAULT_INDEX_TYPE: &str = "VARCHAR(255)";

/// Definition of a JSON field index.
///
/// # Example
///
/// ```rust
/// use docstore_client::JsonIndex;
///
/// let index = JsonIndex::new("email").unique(true).nullable(false);
/// assert_eq!(index.field_path(), "email");
/// assert_eq!(index.data_type_text(), "VARCHAR(255)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonIndex {
    field_path: String,
    data_type: String,
    unique: bool,
    nullable: bool,
}

impl JsonIndex {
    /// Creates a non-unique, nullable `VARCHAR(255)` index on `field_path`.
    pub fn new(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            data_type: DEFAULT_INDEX_TYPE.to_string(),
            unique: false,
            nullable: true,
        }
    }

    /// Sets the generated-column type.
    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    /// Sets whether the index is unique.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets whether the generated column accepts NULL.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Returns the field path.
    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    /// Returns the generated-column type as given.
    pub fn data_type_text(&self) -> &str {
        &self.data_type
    }

    /// Returns whether the index is unique.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns whether the generated column accepts NULL.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl Session {
    /// Creates a generated column and index for a JSON field and records the
    /// field in the catalog. Returns the generated column name.
    ///
    /// The engine commits DDL implicitly, so the steps cannot share a
    /// transaction. If the index or the catalog write fails after the column
    /// was added, the column (and with it the index) is dropped again before
    /// the error is returned.
    pub async fn create_index_for_json_field(
        &self,
        table: &str,
        json_col: &str,
        index: &JsonIndex,
    ) -> StoreResult<String> {
        let backend = self.backend("createIndexForJsonField")?;
        let table = TableName::parse(table)?;
        let json = Ident::new(json_col, "jsonCol")?;
        let field = FieldPath::parse(&index.field_path)?;
        let data_type = ColumnType::parse(&index.data_type)?;
        let column = field.hashed_column();

        let null_clause = if index.nullable { "" } else { " NOT NULL" };
        let add_column = format!(
            "ALTER TABLE {table} ADD COLUMN {column} {data_type} GENERATED ALWAYS AS ({}){null_clause}",
            json_extract(&json, &field)
        );
        let unique = if index.unique { "UNIQUE " } else { "" };
        let create_index = format!("CREATE {unique}INDEX {column} ON {table} ({column})");

        // the catalog may not know this column yet
        let own_name = [(column.as_str().to_string(), field.as_str().to_string())];
        let name_field =
            |err: StoreError| err.map_engine_message(|m| catalog::rewrite_message(&m, &own_name));

        if let Err(err) = self.execute(backend.as_ref(), &add_column, Vec::new()).await {
            let err = name_field(err);
            return Err(self.enhance_error(backend.as_ref(), &table, err).await);
        }

        let indexed = match self.execute(backend.as_ref(), &create_index, Vec::new()).await {
            Ok(_) => self.upsert_mapping(backend.as_ref(), &table, &field).await,
            Err(err) => Err(err),
        };
        if let Err(err) = indexed {
            let err = name_field(err);
            let err = self.enhance_error(backend.as_ref(), &table, err).await;
            self.drop_generated_column(backend.as_ref(), &table, &column).await;
            return Err(err);
        }

        info!(
            "Created {}index {} on {} for field {}",
            unique.to_lowercase(),
            column.as_str(),
            table.as_str(),
            field
        );
        Ok(column.as_str().to_string())
    }

    async fn drop_generated_column(
        &self,
        backend: &dyn Backend,
        table: &TableName,
        column: &Ident,
    ) {
        let sql = format!("ALTER TABLE {table} DROP COLUMN {column}");
        match self.execute(backend, &sql, Vec::new()).await {
            Ok(_) => warn!("Rolled back generated column {} on {}", column.as_str(), table.as_str()),
            Err(err) => warn!(
                "Failed to roll back generated column {} on {}: {}",
                column.as_str(),
                table.as_str(),
                err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_common::{hash_field, StoreError, Value};

    use crate::session::test_support::open_session;

    #[tokio::test]
    async fn test_create_index_statements() {
        let (session, mock) = open_session().await;
        let index = JsonIndex::new("address.city")
            .data_type("varchar( 64 )")
            .unique(true)
            .nullable(false);

        let column = session
            .create_index_for_json_field("shop.users", "doc", &index)
            .await
            .unwrap();
        assert_eq!(column, hash_field("address.city"));

        let statements = mock.statements();
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[0].sql,
            format!(
                "ALTER TABLE `shop`.`users` ADD COLUMN `{column}` VARCHAR(64) GENERATED ALWAYS AS \
                 (JSON_UNQUOTE(JSON_EXTRACT(`doc`, '$.address.city'))) NOT NULL"
            )
        );
        assert_eq!(
            statements[1].sql,
            format!("CREATE UNIQUE INDEX `{column}` ON `shop`.`users` (`{column}`)")
        );
        assert_eq!(
            statements[2].params,
            vec![
                Value::String(column),
                Value::from("shop.users"),
                Value::from("address.city"),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_index_defaults() {
        let (session, mock) = open_session().await;
        session
            .create_index_for_json_field("users", "doc", &JsonIndex::new("age"))
            .await
            .unwrap();

        let log = mock.sql_log();
        assert!(log[0].contains("VARCHAR(255) GENERATED ALWAYS AS"));
        assert!(!log[0].contains("NOT NULL"));
        assert!(log[1].starts_with("CREATE INDEX"));
    }

    #[tokio::test]
    async fn test_create_index_rejects_bad_arguments() {
        let (session, mock) = open_session().await;

        let err = session
            .create_index_for_json_field("users", "doc", &JsonIndex::new("a..b"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "please provide valid fieldPath");

        let err = session
            .create_index_for_json_field(
                "users",
                "doc",
                &JsonIndex::new("age").data_type("INT) ; DROP TABLE users; --"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "please provide valid dataType");

        assert!(mock.sql_log().is_empty());
    }

    #[tokio::test]
    async fn test_create_index_rolls_back_column_when_catalog_write_fails() {
        let (session, mock) = open_session().await;
        mock.push_affected(0);
        mock.push_affected(0);
        mock.push_error(StoreError::engine("catalog is read only"));

        let err = session
            .create_index_for_json_field("users", "doc", &JsonIndex::new("age"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "catalog is read only");

        let log = mock.sql_log();
        assert_eq!(log.len(), 4);
        assert_eq!(
            log[3],
            format!("ALTER TABLE `users` DROP COLUMN `{}`", hash_field("age"))
        );
    }

    #[tokio::test]
    async fn test_create_index_rolls_back_column_when_index_fails() {
        let (session, mock) = open_session().await;
        let column = hash_field("email");
        mock.push_affected(0);
        mock.push_error(StoreError::Engine {
            code: Some(docstore_common::ER_DUP_ENTRY),
            state: None,
            message: format!("Duplicate entry 'a@b.c' for key 'users.{column}'"),
        });

        let err = session
            .create_index_for_json_field("users", "doc", &JsonIndex::new("email").unique(true))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_entry());
        assert_eq!(err.to_string(), "Duplicate entry 'a@b.c' for key 'users.email'");
        assert!(!err.to_string().contains(&column));

        // named without a catalog lookup: the row is not written yet
        let log = mock.sql_log();
        assert_eq!(log.len(), 3);
        assert!(log.iter().all(|sql| !sql.contains("field_hash_map")));
        assert_eq!(log[2], format!("ALTER TABLE `users` DROP COLUMN `{column}`"));
    }

    #[tokio::test]
    async fn test_create_index_names_field_when_column_add_fails() {
        let (session, mock) = open_session().await;
        let column = hash_field("address.city");
        mock.push_error(StoreError::Engine {
            code: Some(1048),
            state: Some("23000".to_string()),
            message: format!("Column '{column}' cannot be null"),
        });

        let err = session
            .create_index_for_json_field(
                "users",
                "doc",
                &JsonIndex::new("address.city").nullable(false),
            )
            .await
            .unwrap_err();
        assert_eq!(err.engine_code(), Some(1048));
        assert_eq!(err.to_string(), "Column 'address.city' cannot be null");
        assert_eq!(mock.sql_log().len(), 1);
    }

    #[tokio::test]
    async fn test_create_index_ddl_failure_skips_catalog() {
        let (session, mock) = open_session().await;
        mock.push_error(StoreError::engine("Duplicate column name"));

        let err = session
            .create_index_for_json_field("users", "doc", &JsonIndex::new("age"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate column name");
        assert_eq!(mock.sql_log().len(), 1);
    }
}
