//! Table and database lifecycle.

use docstore_common::error::StoreResult;
use docstore_common::{Ident, TableName};
use tracing::{info, warn};

use super::Session;
use crate::catalog;

impl Session {
    /// Creates a document table:
    /// `<pk> VARCHAR(255) NOT NULL PRIMARY KEY, <json> JSON NOT NULL`.
    pub async fn create_table(
        &self,
        table: &str,
        primary_key_col: &str,
        json_col: &str,
    ) -> StoreResult<()> {
        let backend = self.backend("createTable")?;
        let table = TableName::parse(table)?;
        let pk = Ident::new(primary_key_col, "primaryKeyCol")?;
        let json = Ident::new(json_col, "jsonCol")?;

        let sql = format!(
            "CREATE TABLE {table} ({pk} VARCHAR(255) NOT NULL PRIMARY KEY, {json} JSON NOT NULL)"
        );
        self.execute(backend.as_ref(), &sql, Vec::new()).await?;
        info!("Created table {}", table.as_str());
        Ok(())
    }

    /// Drops a table if it exists and forgets its catalog rows.
    ///
    /// The drop decides the outcome; catalog cleanup is best-effort.
    pub async fn delete_table(&self, table: &str) -> StoreResult<()> {
        let backend = self.backend("deleteTable")?;
        let table = TableName::parse(table)?;

        let sql = format!("DROP TABLE IF EXISTS {table}");
        self.execute(backend.as_ref(), &sql, Vec::new()).await?;

        if let Err(err) = self
            .execute(
                backend.as_ref(),
                &catalog::delete_table_sql(),
                vec![table.as_str().into()],
            )
            .await
        {
            warn!("Catalog cleanup for table {} failed: {}", table.as_str(), err);
        }
        Ok(())
    }

    /// Drops a database if it exists and forgets catalog rows of its tables.
    ///
    /// The drop decides the outcome; catalog cleanup is best-effort.
    pub async fn delete_database(&self, database: &str) -> StoreResult<()> {
        let backend = self.backend("deleteDataBase")?;
        let db = Ident::new(database, "database")?;

        let sql = format!("DROP DATABASE IF EXISTS {db}");
        self.execute(backend.as_ref(), &sql, Vec::new()).await?;
        info!("Dropped database {}", db.as_str());

        if let Err(err) = self
            .execute(
                backend.as_ref(),
                &catalog::delete_database_sql(),
                vec![catalog::like_prefix(db.as_str()).into()],
            )
            .await
        {
            warn!("Catalog cleanup for database {} failed: {}", db.as_str(), err);
        }
        Ok(())
    }

    /// Lists database names in engine order.
    pub async fn list_databases(&self) -> StoreResult<Vec<String>> {
        let backend = self.backend("listDatabases")?;
        let rows = self
            .query(backend.as_ref(), "SHOW DATABASES", Vec::new())
            .await?;
        Ok(first_column(&rows))
    }

    /// Lists table names of `database` in engine order.
    pub async fn list_tables(&self, database: &str) -> StoreResult<Vec<String>> {
        let backend = self.backend("listTables")?;
        let db = Ident::new(database, "database")?;

        let sql = format!("SHOW TABLES FROM {db}");
        let rows = self.query(backend.as_ref(), &sql, Vec::new()).await?;
        Ok(first_column(&rows))
    }
}

fn first_column(rows: &[crate::backend::Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get_index(0).and_then(|v| v.as_str()).map(str::to_string))
        .collect()
}
