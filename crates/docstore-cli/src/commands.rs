//! Subcommands.
//!
//! Each subcommand maps to one session operation. Results are returned as
//! JSON values for the caller to print.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Subcommand;
use docstore_client::{JsonIndex, Session, DEFAULT_INDEX_TYPE};
use docstore_common::{ConnectionConfig, StoreResult};
use serde_json::{json, Value as JsonValue};
use tracing::warn;

/// A docstore operation.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a document table
    CreateTable {
        /// Table name (`table` or `database.table`)
        table: String,
        /// Primary key column
        primary_key_col: String,
        /// JSON document column
        json_col: String,
    },
    /// Drop a table and its catalog entries
    DeleteTable {
        /// Table name
        table: String,
    },
    /// Drop a database and its catalog entries
    DeleteDatabase {
        /// Database name
        database: String,
    },
    /// Insert or replace a document
    Put {
        /// Table name
        table: String,
        /// Primary key column
        primary_key_col: String,
        /// Primary key value
        key: String,
        /// JSON document column
        json_col: String,
        /// Document as JSON text
        document: String,
    },
    /// Fetch a document by primary key
    Get {
        /// Table name
        table: String,
        /// Primary key column
        primary_key_col: String,
        /// Primary key value
        key: String,
        /// JSON document column
        json_col: String,
    },
    /// Delete a document by primary key
    DeleteKey {
        /// Table name
        table: String,
        /// Primary key column
        primary_key_col: String,
        /// Primary key value
        key: String,
    },
    /// Find documents by field values without using indexes
    Scan {
        /// Table name
        table: String,
        /// JSON document column
        json_col: String,
        /// Filter object as JSON text, e.g. '{"address.city": "Paris"}'
        filter: String,
    },
    /// Find documents by field values, using indexes where they exist
    Find {
        /// Table name
        table: String,
        /// JSON document column
        json_col: String,
        /// Filter object as JSON text
        filter: String,
    },
    /// Index a JSON field through a generated column
    CreateIndex {
        /// Table name
        table: String,
        /// JSON document column
        json_col: String,
        /// Dotted field path, e.g. address.city
        field_path: String,
        /// Generated column type
        #[arg(long, default_value = DEFAULT_INDEX_TYPE)]
        data_type: String,
        /// Create a unique index
        #[arg(long)]
        unique: bool,
        /// Declare the generated column NOT NULL
        #[arg(long)]
        not_null: bool,
    },
    /// List the indexes of a table
    Indexes {
        /// Table as `database.table`
        db_dot_table: String,
    },
    /// List databases
    ListDatabases,
    /// List the tables of a database
    ListTables {
        /// Database name
        database: String,
    },
    /// Register field paths in the catalog without indexing them
    SetupMappings {
        /// JSON object mapping table names to arrays of field paths
        mappings: String,
    },
    /// Show the catalog entries of a table
    Mappings {
        /// Table name
        table: String,
    },
    /// Tokenize a query string (no connection needed)
    Tokenize {
        /// Input text
        input: String,
    },
}

/// Runs `command`; returns the value to print, if any.
pub async fn run(command: Command, config: &ConnectionConfig) -> Result<Option<JsonValue>> {
    if let Command::Tokenize { input } = &command {
        return tokenize(input).map(Some);
    }

    let session = Session::new();
    session.init(config).await.context("failed to open session")?;
    let result = dispatch(&session, command).await;
    let closed = session.close().await;
    finish(result, closed)
}

/// The operation's outcome wins over a failed close.
fn finish<T>(result: Result<T>, closed: StoreResult<()>) -> Result<T> {
    match (result, closed) {
        (result, Ok(())) => result,
        (Err(err), Err(close_err)) => {
            warn!("Failed to close session: {}", close_err);
            Err(err)
        }
        (Ok(_), Err(close_err)) => {
            Err(anyhow::Error::new(close_err).context("failed to close session"))
        }
    }
}

async fn dispatch(session: &Session, command: Command) -> Result<Option<JsonValue>> {
    let output = match command {
        Command::CreateTable {
            table,
            primary_key_col,
            json_col,
        } => {
            session
                .create_table(&table, &primary_key_col, &json_col)
                .await?;
            None
        }
        Command::DeleteTable { table } => {
            session.delete_table(&table).await?;
            None
        }
        Command::DeleteDatabase { database } => {
            session.delete_database(&database).await?;
            None
        }
        Command::Put {
            table,
            primary_key_col,
            key,
            json_col,
            document,
        } => {
            let document = parse_json("document", &document)?;
            session
                .put(&table, &primary_key_col, &key, &json_col, &document)
                .await?;
            None
        }
        Command::Get {
            table,
            primary_key_col,
            key,
            json_col,
        } => {
            let doc = session.get(&table, &primary_key_col, &key, &json_col).await?;
            Some(doc.unwrap_or(JsonValue::Null))
        }
        Command::DeleteKey {
            table,
            primary_key_col,
            key,
        } => {
            session.delete_key(&table, &primary_key_col, &key).await?;
            None
        }
        Command::Scan {
            table,
            json_col,
            filter,
        } => {
            let filter = parse_json("filter", &filter)?;
            let docs = session.get_from_non_index(&table, &json_col, &filter).await?;
            Some(JsonValue::Array(docs))
        }
        Command::Find {
            table,
            json_col,
            filter,
        } => {
            let filter = parse_json("filter", &filter)?;
            let docs = session.find(&table, &json_col, &filter).await?;
            Some(JsonValue::Array(docs))
        }
        Command::CreateIndex {
            table,
            json_col,
            field_path,
            data_type,
            unique,
            not_null,
        } => {
            let index = JsonIndex::new(field_path)
                .data_type(data_type)
                .unique(unique)
                .nullable(!not_null);
            let column = session
                .create_index_for_json_field(&table, &json_col, &index)
                .await?;
            Some(json!({ "column": column }))
        }
        Command::Indexes { db_dot_table } => {
            let indexes = session.get_table_indexes(&db_dot_table).await?;
            Some(serde_json::to_value(indexes)?)
        }
        Command::ListDatabases => Some(json!(session.list_databases().await?)),
        Command::ListTables { database } => Some(json!(session.list_tables(&database).await?)),
        Command::SetupMappings { mappings } => {
            let mappings: BTreeMap<String, Vec<String>> = serde_json::from_str(&mappings)
                .context("mappings must be an object of string arrays")?;
            let written = session.setup_field_hash_mappings(&mappings).await?;
            Some(json!({ "written": written }))
        }
        Command::Mappings { table } => {
            let mappings = session.field_mappings(&table).await?;
            Some(serde_json::to_value(mappings)?)
        }
        Command::Tokenize { input } => Some(tokenize(&input)?),
    };
    Ok(output)
}

fn tokenize(input: &str) -> Result<JsonValue> {
    let tokens = docstore_query::tokenize(input)?;
    Ok(JsonValue::Array(
        tokens
            .into_iter()
            .map(|t| json!({ "kind": t.kind.to_string(), "text": t.text }))
            .collect(),
    ))
}

fn parse_json(argument: &str, text: &str) -> Result<JsonValue> {
    serde_json::from_str(text).with_context(|| format!("{argument} is not valid JSON"))
}
