//! End-to-end integration tests for docstore.
//!
//! These tests run every operation against a live engine. Each one creates
//! its own table and drops it afterwards; all of them skip when no engine is
//! configured (see the crate docs).

use std::sync::Arc;

use docstore_client::{JsonIndex, Session};
use docstore_common::{hash_field, ErrorKind};
use docstore_query::{combine, tokenize, TokenKind};
use docstore_test::{open_session, test_database, unique_table};
use serde::{Deserialize, Serialize};
use serde_json::json;

const PK: &str = "id";
const DOC: &str = "doc";

/// Creates a fresh document table.
async fn fresh_table(session: &Session, prefix: &str) -> String {
    let table = unique_table(prefix);
    session
        .create_table(&table, PK, DOC)
        .await
        .expect("Failed to create table");
    table
}

/// Test put then get returns the same document.
#[tokio::test]
async fn test_round_trip() {
    let Some((session, _config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "round_trip").await;

    let doc = json!({
        "name": "Ada",
        "tags": ["math", "engines"],
        "address": {"city": "London", "zip": null},
        "score": 9.5,
        "active": true
    });
    session.put(&table, PK, "u1", DOC, &doc).await.expect("put failed");

    let fetched = session.get(&table, PK, "u1", DOC).await.expect("get failed");
    assert_eq!(fetched, Some(doc));

    session.delete_table(&table).await.expect("delete_table failed");
    session.close().await.expect("close failed");
}

/// Test typed documents.
#[tokio::test]
async fn test_typed_round_trip() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Order {
        sku: String,
        quantity: u32,
    }

    let Some((session, _config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "typed").await;

    let order = Order {
        sku: "A-1".to_string(),
        quantity: 3,
    };
    session.put(&table, PK, "o1", DOC, &order).await.expect("put failed");
    let fetched: Option<Order> = session
        .get_as(&table, PK, "o1", DOC)
        .await
        .expect("get_as failed");
    assert_eq!(fetched, Some(order));

    session.delete_table(&table).await.expect("delete_table failed");
    session.close().await.expect("close failed");
}

/// Test a second put with the same key replaces the document.
#[tokio::test]
async fn test_overwrite() {
    let Some((session, _config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "overwrite").await;

    session.put(&table, PK, "k", DOC, &json!({"v": 1})).await.unwrap();
    session.put(&table, PK, "k", DOC, &json!({"v": 2})).await.unwrap();

    let fetched = session.get(&table, PK, "k", DOC).await.unwrap();
    assert_eq!(fetched, Some(json!({"v": 2})));

    session.delete_table(&table).await.unwrap();
    session.close().await.unwrap();
}

/// Test delete_key on present and absent keys, and get of an absent key.
#[tokio::test]
async fn test_delete_and_absence() {
    let Some((session, _config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "delete").await;

    session.put(&table, PK, "k", DOC, &json!({"v": 1})).await.unwrap();
    session.delete_key(&table, PK, "k").await.expect("delete of present key failed");
    session.delete_key(&table, PK, "k").await.expect("delete of absent key failed");

    let fetched = session.get(&table, PK, "k", DOC).await.expect("get of absent key failed");
    assert_eq!(fetched, None);

    session.delete_table(&table).await.unwrap();
    session.close().await.unwrap();
}

/// Test a missing table surfaces the engine's native code.
#[tokio::test]
async fn test_missing_table_keeps_native_code() {
    let Some((session, _config)) = open_session().await else {
        return;
    };
    let table = unique_table("missing");

    let err = session.get(&table, PK, "k", DOC).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);
    assert!(err.is_no_such_table(), "unexpected error: {err:?}");

    let err = session.put(&table, PK, "k", DOC, &json!({"v": 1})).await.unwrap_err();
    assert!(err.is_no_such_table(), "unexpected error: {err:?}");
    assert!(err
        .to_string()
        .starts_with("Exception occurred while writing to database\n"));

    session.close().await.unwrap();
}

/// Test the scan rejects bad filters and matches on every field.
#[tokio::test]
async fn test_scan() {
    let Some((session, _config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "scan").await;

    let err = session
        .get_from_non_index(&table, DOC, &json!({"bad name!": 1}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("bad name!"));
    for filter in [json!({}), json!([1, 2]), json!("age")] {
        let err = session.get_from_non_index(&table, DOC, &filter).await.unwrap_err();
        assert_eq!(err.to_string(), "please provide valid queryObject");
    }

    session
        .put(&table, PK, "a", DOC, &json!({"age": 30, "address": {"city": "Paris"}}))
        .await
        .unwrap();
    session
        .put(&table, PK, "b", DOC, &json!({"age": 30, "address": {"city": "Rome"}}))
        .await
        .unwrap();
    session
        .put(&table, PK, "c", DOC, &json!({"age": 41, "address": {"city": "Paris"}}))
        .await
        .unwrap();

    let docs = session
        .get_from_non_index(&table, DOC, &json!({"age": 30, "address.city": "Paris"}))
        .await
        .unwrap();
    assert_eq!(docs, vec![json!({"age": 30, "address": {"city": "Paris"}})]);

    let none = session
        .get_from_non_index(&table, DOC, &json!({"age": 99}))
        .await
        .unwrap();
    assert!(none.is_empty());

    session.delete_table(&table).await.unwrap();
    session.close().await.unwrap();
}

/// Test index introspection and the split `find` query.
#[tokio::test]
async fn test_index_introspection_and_find() {
    let Some((session, config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "indexed").await;

    session
        .put(&table, PK, "a", DOC, &json!({"address": {"city": "Paris"}, "age": 30}))
        .await
        .unwrap();

    let column = session
        .create_index_for_json_field(&table, DOC, &JsonIndex::new("address.city"))
        .await
        .expect("create_index_for_json_field failed");
    assert_eq!(column, hash_field("address.city"));

    let qualified = format!("{}.{table}", test_database(&config));
    let indexes = session.get_table_indexes(&qualified).await.unwrap();
    assert_eq!(indexes.len(), 2, "unexpected indexes: {indexes:?}");

    let primary: Vec<_> = indexes.iter().filter(|i| i.is_primary).collect();
    assert_eq!(primary.len(), 1);
    assert_eq!(primary[0].json_field, None);

    let secondary = indexes.iter().find(|i| !i.is_primary).unwrap();
    assert_eq!(secondary.json_field.as_deref(), Some("address.city"));
    assert_eq!(secondary.column_name, column);

    let mappings = session.field_mappings(&table).await.unwrap();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].field_name, "address.city");

    let found = session
        .find(&table, DOC, &json!({"address.city": "Paris", "age": 30}))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    session.delete_table(&table).await.unwrap();
    assert!(session.field_mappings(&table).await.unwrap().is_empty());
    session.close().await.unwrap();
}

/// Test a unique-index violation names the field, not the hash.
#[tokio::test]
async fn test_duplicate_entry_is_enhanced() {
    let Some((session, _config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "unique").await;

    session
        .create_index_for_json_field(&table, DOC, &JsonIndex::new("email").unique(true))
        .await
        .unwrap();
    session.put(&table, PK, "a", DOC, &json!({"email": "a@b.c"})).await.unwrap();

    let err = session
        .put(&table, PK, "b", DOC, &json!({"email": "a@b.c"}))
        .await
        .unwrap_err();
    assert!(err.is_duplicate_entry(), "unexpected error: {err:?}");
    let message = err.to_string();
    assert!(message.contains("email"), "{message}");
    assert!(!message.contains(&hash_field("email")), "{message}");

    session.delete_table(&table).await.unwrap();
    session.close().await.unwrap();
}

/// Test seeding the catalog for scan-only fields.
#[tokio::test]
async fn test_setup_field_hash_mappings() {
    let Some((session, _config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "seeded").await;
    let missing = unique_table("never_created");

    let mut mappings = std::collections::BTreeMap::new();
    mappings.insert(table.clone(), vec!["a".to_string(), "b.c".to_string()]);
    mappings.insert(missing, vec!["x".to_string()]);

    let written = session.setup_field_hash_mappings(&mappings).await.unwrap();
    assert_eq!(written, 2);
    // replace-style writes: seeding again does not duplicate rows
    session.setup_field_hash_mappings(&mappings).await.unwrap();
    assert_eq!(session.field_mappings(&table).await.unwrap().len(), 2);

    session.delete_table(&table).await.unwrap();
    session.close().await.unwrap();
}

/// Test listing databases and tables.
#[tokio::test]
async fn test_listing() {
    let Some((session, config)) = open_session().await else {
        return;
    };
    let table = fresh_table(&session, "listed").await;
    let database = test_database(&config).to_string();

    let databases = session.list_databases().await.unwrap();
    assert!(databases.contains(&database));
    assert!(databases.iter().any(|d| d == "system"));

    let tables = session.list_tables(&database).await.unwrap();
    assert!(tables.contains(&table));

    session.delete_table(&table).await.unwrap();
    let tables = session.list_tables(&database).await.unwrap();
    assert!(!tables.contains(&table));
    session.close().await.unwrap();
}

/// Test N concurrent puts with distinct keys.
#[tokio::test]
async fn test_concurrent_puts() {
    const N: usize = 16;

    let Some((session, _config)) = open_session().await else {
        return;
    };
    let session = Arc::new(session);
    let table = Arc::new(fresh_table(&session, "concurrent").await);

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let session = Arc::clone(&session);
            let table = Arc::clone(&table);
            tokio::spawn(async move {
                session
                    .put(&table, PK, &format!("k{i}"), DOC, &json!({"i": i}))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task panicked").expect("put failed");
    }

    for i in 0..N {
        let doc = session.get(&table, PK, &format!("k{i}"), DOC).await.unwrap();
        assert_eq!(doc, Some(json!({"i": i})));
    }

    session.delete_table(&table).await.unwrap();
    session.close().await.unwrap();
}

/// Test independent sessions and the session lifecycle.
#[tokio::test]
async fn test_session_lifecycle() {
    let Some((first, config)) = open_session().await else {
        return;
    };
    let second = Session::new();
    second.init(&config).await.expect("second session failed");

    let err = first.init(&config).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionState);

    first.close().await.unwrap();
    first.close().await.unwrap();
    let err = first.list_databases().await.unwrap_err();
    assert_eq!(err.to_string(), "Please call init before listDatabases");

    // closing one session leaves the other usable
    assert!(second.list_databases().await.is_ok());
    second.close().await.unwrap();
}

/// Test hash determinism (no engine needed).
#[test]
fn test_hash_determinism() {
    let long = vec!["segment"; 80].join(".");
    for p in ["a", "a.b", "address.city", "address.cityx", long.as_str()] {
        assert_eq!(hash_field(p), hash_field(p));
        assert!(hash_field(p).len() < 64);
    }
    assert_ne!(hash_field("address.city"), hash_field("address.cityx"));
}

/// Test transformer and tokenizer laws (no engine needed).
#[test]
fn test_query_laws() {
    assert_eq!(combine("", ""), "");
    assert_eq!(combine("x", ""), "x");
    assert_eq!(combine("", "y"), "y");
    assert_eq!(combine("x", "y"), "x AND y");

    assert!(tokenize("").unwrap().is_empty());
    for k in 1..=8 {
        let tokens = tokenize(&" ".repeat(k)).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Space);
        assert_eq!(tokens[0].text.len(), k);
    }

    let err = tokenize("  a ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lexical);
    let message = err.to_string();
    assert!(message.contains("'a'"));
    assert!(message.contains("  a "));
}
