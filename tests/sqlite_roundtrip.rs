//! Runs generated DDL and CRUD statements against an in-memory SQLite database.

use std::sync::Arc;

use tablesmith::traits::ConnectionParams;
use tablesmith::{
    ConnectionConfig, DatabaseConnection, DatabaseError, DatabaseType, SchemaRegistry,
    SelectParams, StatementOutcome, Value, Values,
};

const SCHEMA: &str = r#"{
    "authors": {
        "id": { "type": "INTEGER" },
        "name": { "type": "TEXT", "nullable": false },
        "primary_key": "id"
    },
    "books": {
        "id": { "type": "INTEGER" },
        "author_id": {
            "type": "INTEGER",
            "foreign_key": { "table": "authors", "column": "id", "on_delete": "cascade" }
        },
        "title": { "type": "TEXT" },
        "status": { "type": "TEXT", "default": "draft" },
        "primary_key": "id"
    }
}"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn open() -> DatabaseConnection {
    open_with(SCHEMA).await
}

async fn open_with(schema: &str) -> DatabaseConnection {
    init_tracing();

    let registry = Arc::new(SchemaRegistry::from_json_str(schema).unwrap());
    let config = ConnectionConfig::new(
        "memory".to_string(),
        DatabaseType::SQLite,
        ConnectionParams::in_memory(),
    );

    DatabaseConnection::open(config, registry).await.unwrap()
}

#[test]
fn verify_tables_is_idempotent() {
    smol::block_on(async {
        let mut conn = open().await;

        let first = conn.verify_tables().await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first[1].contains("CONSTRAINT fk_books_author_id FOREIGN KEY(author_id)"));
        assert!(first[1].ends_with("REFERENCES authors(id) ON DELETE CASCADE);"));

        let second = conn.verify_tables().await.unwrap();
        assert_eq!(first, second);
        assert!(!conn.has_error());
    });
}

#[test]
fn crud_roundtrip() {
    smol::block_on(async {
        let mut conn = open().await;
        conn.verify_tables().await.unwrap();

        conn.insert("authors", &Values::new().set("name", "O'Brien"))
            .await
            .unwrap();
        assert_eq!(conn.insert_id().await, Some(1));

        conn.insert(
            "books",
            &Values::new().set("author_id", 1).set("title", "First"),
        )
        .await
        .unwrap();
        conn.insert(
            "books",
            &Values::new().set("author_id", 1).set("title", "Second"),
        )
        .await
        .unwrap();
        assert_eq!(conn.insert_id().await, Some(2));

        let authors = conn
            .select(
                "authors",
                &SelectParams::new().filter("name = 'O''Brien'"),
            )
            .await
            .unwrap();
        assert_eq!(authors.row_count, 1);
        assert_eq!(
            authors.rows[0].get_value(1).and_then(|v| v.as_str()),
            Some("O'Brien")
        );

        let books = conn
            .select(
                "books",
                &SelectParams::new()
                    .columns(["title", "status"])
                    .order_by("id DESC")
                    .limit(1),
            )
            .await
            .unwrap();
        assert_eq!(books.row_count, 1);
        assert_eq!(books.rows[0].get_value(0), Some(&Value::Text("Second".into())));
        assert_eq!(books.rows[0].get_value(1), Some(&Value::Text("draft".into())));
        assert_eq!(conn.num_rows().await, 1);

        let outcome = conn
            .update("books", &Values::new().set("title", "'Revised'"), "id=1")
            .await
            .unwrap();
        assert_eq!(outcome.rows_affected(), 1);

        let outcome = conn
            .update("books", &Values::new().set("title", "'Lost'"), "")
            .await
            .unwrap();
        assert_eq!(outcome, StatementOutcome::Skipped);

        let updated = conn
            .update_all("books", &Values::new().set("status", "it's done"))
            .await
            .unwrap();
        assert_eq!(updated.rows_affected, 2);

        let first = conn
            .select("books", &SelectParams::new().filter("id = 1"))
            .await
            .unwrap();
        assert_eq!(first.rows[0].get_value(2).and_then(|v| v.as_str()), Some("Revised"));
        assert_eq!(first.rows[0].get_value(3).and_then(|v| v.as_str()), Some("it's done"));

        // deleting the author cascades to its books
        let outcome = conn.delete("authors", "id=1").await.unwrap();
        assert_eq!(outcome.rows_affected(), 1);

        let remaining = conn.select("books", &SelectParams::new()).await.unwrap();
        assert_eq!(remaining.row_count, 0);
        assert!(!conn.has_error());
    });
}

#[test]
fn rejected_statement_is_recorded() {
    smol::block_on(async {
        let mut conn = open().await;
        conn.verify_tables().await.unwrap();

        let err = conn
            .insert("missing", &Values::new().set("name", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::DriverRejected { .. }));
        assert!(conn.has_error());
        assert!(conn.message().starts_with("Could not insert into table missing"));
        assert!(conn.message().contains("INSERT INTO missing (name) VALUES ('x')"));

        conn.disconnect(false, None).await;
        assert!(!conn.is_connected());
        let err = conn.delete_all("books").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotConnected));
    });
}

#[test]
fn binary_values_roundtrip() {
    smol::block_on(async {
        let mut conn = open_with(
            r#"{
                "attachments": {
                    "id": { "type": "INTEGER" },
                    "data": { "type": "BLOB" },
                    "primary_key": "id"
                }
            }"#,
        )
        .await;
        conn.verify_table("attachments").await.unwrap();

        let payload = vec![0xff, 0x00, 0x80];
        conn.insert(
            "attachments",
            &Values::new().set("data", Value::Bytes(payload.clone())),
        )
        .await
        .unwrap();

        let stored = conn
            .select("attachments", &SelectParams::new().columns(["data"]))
            .await
            .unwrap();
        assert_eq!(stored.rows[0].get_value(0), Some(&Value::Bytes(payload)));

        let outcome = conn
            .update(
                "attachments",
                &Values::new().set("data", Value::Bytes(vec![0x00])),
                "id=1",
            )
            .await
            .unwrap();
        assert_eq!(outcome.rows_affected(), 1);

        let stored = conn
            .select("attachments", &SelectParams::new().columns(["data"]))
            .await
            .unwrap();
        assert_eq!(stored.rows[0].get_value(0), Some(&Value::Bytes(vec![0x00])));
        assert!(!conn.has_error());
    });
}
