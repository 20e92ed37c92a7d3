#![cfg(feature = "sqlite")]

use futures::FutureExt;
use rustf_querygen::runtime::{
    with_tx, BatchMode, BatchReply, BatchResults, Error, QueryExecutor, SqlValue, SqliteExecutor,
    ToSql,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::panic::AssertUnwindSafe;

async fn setup() -> SqliteExecutor {
    let _ = env_logger::builder().is_test(true).try_init();

    // One connection that never closes keeps the in-memory database alive
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    let db = SqliteExecutor::from_pool(pool);
    db.execute(
        "CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, bio TEXT)",
        &[],
    )
    .await
    .expect("Failed to create table");
    db
}

async fn count_authors(db: &dyn QueryExecutor) -> i64 {
    db.query_row("SELECT count(*) FROM authors", &[])
        .await
        .unwrap()
        .get(0)
        .unwrap()
}

#[tokio::test]
async fn test_query_row_on_empty_result_is_not_found() {
    let db = setup().await;

    let error = db
        .query_row("SELECT id FROM authors WHERE id = ?", &[1i64.to_sql()])
        .await
        .unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_rows_decode_positionally() {
    let db = setup().await;
    let result = db
        .execute(
            "INSERT INTO authors (name, bio) VALUES (?, ?)",
            &["Ursula".to_sql(), None::<String>.to_sql()],
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);
    assert_eq!(result.last_insert_id(), Some(1));

    let rows = db
        .query("SELECT id, name, bio FROM authors", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<i64>(0).unwrap(), 1);
    assert_eq!(rows[0].get::<String>(1).unwrap(), "Ursula");
    assert_eq!(rows[0].get::<Option<String>>(2).unwrap(), None);
    assert_eq!(rows[0].value(2), Some(&SqlValue::Null));
}

#[tokio::test]
async fn test_failing_batch_item_does_not_abort_siblings() {
    let db = setup().await;
    let items = vec![
        vec![1i64.to_sql(), "a".to_sql()],
        vec![1i64.to_sql(), "b".to_sql()],
        vec![2i64.to_sql(), "c".to_sql()],
    ];

    let replies = db
        .send_batch(
            "INSERT INTO authors (id, name) VALUES (?, ?)",
            BatchMode::Exec,
            items,
        )
        .await
        .unwrap();
    let results = BatchResults::from_replies(replies, BatchReply::into_exec);

    assert_eq!(results.len(), 3);
    assert!(results.get(0).unwrap().is_ok());
    assert!(matches!(results.get(1), Some(Err(Error::Database(_)))));
    assert!(results.get(2).unwrap().is_ok());
    assert_eq!(count_authors(&db).await, 2);
}

#[tokio::test]
async fn test_batch_rows_in_submission_order() {
    let db = setup().await;
    for name in ["a", "b", "c"] {
        db.execute("INSERT INTO authors (name) VALUES (?)", &[name.to_sql()])
            .await
            .unwrap();
    }

    let items = vec![vec![3i64.to_sql()], vec![42i64.to_sql()], vec![1i64.to_sql()]];
    let replies = db
        .send_batch(
            "SELECT name FROM authors WHERE id = ?",
            BatchMode::QueryRow,
            items,
        )
        .await
        .unwrap();
    let results = BatchResults::from_replies(replies, |reply| {
        reply.into_row().and_then(|row| row.get::<String>(0))
    });

    let outcomes = results.into_results();
    assert_eq!(outcomes[0].as_ref().unwrap(), "c");
    assert!(outcomes[1].as_ref().unwrap_err().is_not_found());
    assert_eq!(outcomes[2].as_ref().unwrap(), "a");
}

#[tokio::test]
async fn test_bulk_copy_reports_partial_count() {
    let db = setup().await;
    let rows = vec![
        vec!["a".to_sql()],
        vec!["b".to_sql()],
        vec!["a".to_sql()],
        vec!["d".to_sql()],
    ];

    let outcome = db.copy_from("authors", &["name"], rows).await;
    match outcome.into_result() {
        Err(Error::BulkCopy { written, source }) => {
            assert_eq!(written, 2);
            assert!(matches!(*source, Error::Database(_)));
        }
        other => panic!("expected a bulk copy error, got {:?}", other),
    }
    assert_eq!(count_authors(&db).await, 2);
}

#[tokio::test]
async fn test_bulk_copy_complete() {
    let db = setup().await;
    let rows = vec![
        vec!["a".to_sql(), "first".to_sql()],
        vec!["b".to_sql(), None::<String>.to_sql()],
    ];

    let written = db
        .copy_from("authors", &["name", "bio"], rows)
        .await
        .into_result()
        .unwrap();
    assert_eq!(written, 2);
}

#[tokio::test]
async fn test_with_tx_commits_on_success() {
    let db = setup().await;

    let id = with_tx(&db, |tx| {
        Box::pin(async move {
            let result = tx
                .execute("INSERT INTO authors (name) VALUES (?)", &["a".to_sql()])
                .await?;
            tx.execute("INSERT INTO authors (name) VALUES (?)", &["b".to_sql()])
                .await?;
            Ok::<_, Error>(result.last_insert_id())
        })
    })
    .await
    .unwrap();

    assert_eq!(id, Some(1));
    assert_eq!(count_authors(&db).await, 2);
}

#[tokio::test]
async fn test_with_tx_rolls_back_and_returns_the_error() {
    let db = setup().await;

    let error = with_tx(&db, |tx| {
        Box::pin(async move {
            tx.execute("INSERT INTO authors (name) VALUES (?)", &["a".to_sql()])
                .await?;
            Err::<(), _>(Error::Other("stop".to_string()))
        })
    })
    .await
    .unwrap_err();

    assert!(matches!(error, Error::Other(ref message) if message == "stop"));
    assert_eq!(count_authors(&db).await, 0);
}

#[tokio::test]
async fn test_with_tx_rolls_back_on_panic() {
    let db = setup().await;

    let outcome = AssertUnwindSafe(with_tx(&db, |tx| {
        Box::pin(async move {
            tx.execute("INSERT INTO authors (name) VALUES (?)", &["a".to_sql()])
                .await?;
            if tx.backend() == rustf_querygen::runtime::Backend::Sqlite {
                panic!("callback panicked");
            }
            Ok::<(), Error>(())
        })
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    assert_eq!(count_authors(&db).await, 0);
}

#[tokio::test]
async fn test_closed_transaction_rejects_calls() {
    let db = setup().await;
    let tx = db.begin().await.unwrap();
    tx.commit().await.unwrap();

    assert!(matches!(
        tx.execute("SELECT 1", &[]).await,
        Err(Error::TransactionClosed)
    ));
    assert!(matches!(tx.rollback().await, Err(Error::TransactionClosed)));
}
