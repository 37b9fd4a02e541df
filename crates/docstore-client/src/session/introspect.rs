//! Index introspection.

use std::collections::HashMap;
use std::sync::OnceLock;

use docstore_common::error::StoreResult;
use docstore_common::{is_hashed_column, TableName};
use regex::Regex;
use serde::Serialize;

use super::Session;

/// One entry of [`Session::get_table_indexes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    /// Index name (`PRIMARY` for the primary key).
    pub index_name: String,
    /// Indexed column.
    pub column_name: String,
    /// JSON field path behind a generated column; `None` for the primary key
    /// and ordinary columns.
    pub json_field: Option<String>,
    /// True if `Non_unique` is 0.
    pub is_unique: bool,
    /// True for the primary key.
    pub is_primary: bool,
}

const PRIMARY_INDEX: &str = "PRIMARY";

fn json_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\.([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)")
            .expect("valid JSON path regex")
    })
}

/// Extracts the dotted field path from a generated-column expression.
fn field_from_expression(expression: &str) -> Option<String> {
    json_path_regex()
        .captures(expression)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

impl Session {
    /// Lists the indexes of `db_dot_table` with the JSON field behind each
    /// generated column.
    ///
    /// `db_dot_table` must name both database and table.
    pub async fn get_table_indexes(&self, db_dot_table: &str) -> StoreResult<Vec<IndexDescriptor>> {
        let backend = self.backend("getTableIndexes")?;
        let table = TableName::parse_qualified(db_dot_table, "dbDotTable")?;
        let database = table.database().map(|db| db.as_str()).unwrap_or_default();

        let index_rows = self
            .query(backend.as_ref(), &format!("SHOW INDEX FROM {table}"), Vec::new())
            .await?;

        let generated_rows = self
            .query(
                backend.as_ref(),
                "SELECT COLUMN_NAME, GENERATION_EXPRESSION FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND GENERATION_EXPRESSION <> ''",
                vec![database.into(), table.table().as_str().into()],
            )
            .await?;

        let mut fields: HashMap<String, String> = generated_rows
            .iter()
            .filter_map(|row| {
                let column = row.get_str("COLUMN_NAME")?;
                let field = field_from_expression(row.get_str("GENERATION_EXPRESSION")?)?;
                Some((column.to_string(), field))
            })
            .collect();

        let mut unresolved: Vec<String> = index_rows
            .iter()
            .filter_map(|row| row.get_str("Column_name"))
            .filter(|c| is_hashed_column(c) && !fields.contains_key(*c))
            .map(str::to_string)
            .collect();
        unresolved.dedup();
        if !unresolved.is_empty() {
            fields.extend(
                self.lookup_fields(backend.as_ref(), &table, &unresolved)
                    .await?,
            );
        }

        let descriptors = index_rows
            .iter()
            .filter_map(|row| {
                let index_name = row.get_str("Key_name")?.to_string();
                let column_name = row.get_str("Column_name")?.to_string();
                let is_primary = index_name == PRIMARY_INDEX;
                let json_field = if is_primary {
                    None
                } else {
                    fields.get(&column_name).cloned()
                };
                Some(IndexDescriptor {
                    is_unique: row.get_i64("Non_unique") == Some(0),
                    is_primary,
                    json_field,
                    index_name,
                    column_name,
                })
            })
            .collect();

        Ok(descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_common::{hash_field, Value};

    use crate::session::test_support::open_session;

    fn index_row(key: &str, column: &str, non_unique: i64) -> Vec<Value> {
        vec![
            Value::from("users"),
            Value::Integer(non_unique),
            Value::from(key),
            Value::from(column),
        ]
    }

    const INDEX_COLUMNS: [&str; 4] = ["Table", "Non_unique", "Key_name", "Column_name"];

    #[test]
    fn test_field_from_expression() {
        assert_eq!(
            field_from_expression(
                "json_unquote(json_extract(`doc`,_utf8mb4\\'$.address.city\\'))"
            ),
            Some("address.city".to_string())
        );
        assert_eq!(field_from_expression("(`a` + 1)"), None);
    }

    #[tokio::test]
    async fn test_primary_and_unique_generated_index() {
        let (session, mock) = open_session().await;
        let email_col = hash_field("email");
        mock.push_rows(
            &INDEX_COLUMNS,
            vec![
                index_row("PRIMARY", "id", 0),
                index_row(&email_col, &email_col, 0),
            ],
        );
        mock.push_rows(
            &["COLUMN_NAME", "GENERATION_EXPRESSION"],
            vec![vec![
                Value::String(email_col.clone()),
                Value::from("json_unquote(json_extract(`doc`,_utf8mb4'$.email'))"),
            ]],
        );

        let indexes = session.get_table_indexes("shop.users").await.unwrap();
        assert_eq!(
            indexes,
            vec![
                IndexDescriptor {
                    index_name: "PRIMARY".to_string(),
                    column_name: "id".to_string(),
                    json_field: None,
                    is_unique: true,
                    is_primary: true,
                },
                IndexDescriptor {
                    index_name: email_col.clone(),
                    column_name: email_col,
                    json_field: Some("email".to_string()),
                    is_unique: true,
                    is_primary: false,
                },
            ]
        );

        let statements = mock.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sql, "SHOW INDEX FROM `shop`.`users`");
        assert_eq!(
            statements[1].params,
            vec![Value::from("shop"), Value::from("users")]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_catalog() {
        let (session, mock) = open_session().await;
        let age_col = hash_field("age");
        mock.push_rows(&INDEX_COLUMNS, vec![index_row(&age_col, &age_col, 1)]);
        mock.push_rows(&["COLUMN_NAME", "GENERATION_EXPRESSION"], Vec::new());
        mock.push_rows(
            &["fieldHash", "fieldName"],
            vec![vec![Value::String(age_col.clone()), Value::from("age")]],
        );

        let indexes = session.get_table_indexes("shop.users").await.unwrap();
        assert_eq!(indexes[0].json_field.as_deref(), Some("age"));
        assert!(!indexes[0].is_unique);
    }

    #[tokio::test]
    async fn test_plain_secondary_index_has_no_field() {
        let (session, mock) = open_session().await;
        mock.push_rows(
            &INDEX_COLUMNS,
            vec![index_row("PRIMARY", "id", 0), index_row("by_id2", "id2", 1)],
        );
        mock.push_rows(&["COLUMN_NAME", "GENERATION_EXPRESSION"], Vec::new());

        let indexes = session.get_table_indexes("shop.users").await.unwrap();
        assert_eq!(indexes.len(), 2);
        assert_eq!(
            indexes[1],
            IndexDescriptor {
                index_name: "by_id2".to_string(),
                column_name: "id2".to_string(),
                json_field: None,
                is_unique: false,
                is_primary: false,
            }
        );
        // ordinary columns never reach the catalog
        assert_eq!(mock.sql_log().len(), 2);
    }

    #[tokio::test]
    async fn test_requires_qualified_name() {
        let (session, mock) = open_session().await;
        for name in ["users", "shop.users; DROP TABLE x", "shop.users.extra"] {
            let err = session.get_table_indexes(name).await.unwrap_err();
            assert_eq!(err.to_string(), "please provide valid dbDotTable");
        }
        assert!(mock.sql_log().is_empty());
    }
}
