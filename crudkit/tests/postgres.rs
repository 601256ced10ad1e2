//! Runs against a live server only when `DATABASE_URL` is set

#![cfg(feature = "postgres")]

use crudkit::{
    Commit, Connection, Error, Fetch, Fields, Frame, PgSession, Projection, Table, Value,
};

/// A fresh session with its own `crudkit_<suffix>` table, or None without a server
async fn setup(suffix: &str) -> Option<(PgSession, String)> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    }
    let mut session = PgSession::connect_env().await.unwrap();
    let table = format!("crudkit_{}_{}", suffix, std::process::id());
    session
        .execute_raw(&format!(
            "CREATE TABLE \"{}\" (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE,
                score INT8,
                active BOOL
            )",
            table
        ))
        .await
        .unwrap();
    session.commit().await.unwrap();
    Some((session, table))
}

async fn teardown(mut session: PgSession, table: &str) {
    session.rollback().await.unwrap();
    session
        .execute_raw(&format!("DROP TABLE IF EXISTS \"{}\"", table))
        .await
        .unwrap();
    session.commit().await.unwrap();
    session.close().await.unwrap();
}

#[tokio::test]
async fn crud_round_trip() {
    let Some((mut session, name)) = setup("crud").await else {
        return;
    };
    {
        let mut users = Table::new(&mut session, &name)
            .unwrap()
            .with_columns(["id", "name", "email", "score", "active"]);

        users
            .insert(
                Fields::new()
                    .with("name", "Ann")
                    .with("email", "ann@example.com")
                    .with("score", 10i64)
                    .with("active", true),
                Commit::Immediate,
            )
            .await
            .unwrap();

        let id = users
            .get_id(Fields::new().with("email", "ann@example.com"))
            .await
            .unwrap();
        assert_eq!(id, Value::I32(1));

        let frame = users
            .select(Projection::All, Fields::new().with("id", 1), Fetch::One)
            .await
            .unwrap();
        assert_eq!(frame.value(0, "score").unwrap(), &Value::I64(10));
        assert_eq!(frame.value(0, "active").unwrap(), &Value::Bool(true));

        let updated = users
            .update(
                Fields::new().with("score", 11i64),
                Fields::new().with("name", "Ann"),
                Commit::Immediate,
            )
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let deleted = users
            .delete(Fields::new().with("email", "ann@example.com"), Commit::Immediate)
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let missing = users.get_id(Fields::new().with("name", "Ann")).await;
        assert!(matches!(missing, Err(Error::EmptyResult { .. })));
    }
    teardown(session, &name).await;
}

#[tokio::test]
async fn bulk_insert_and_unique_violation_rollback() {
    let Some((mut session, name)) = setup("bulk").await else {
        return;
    };
    {
        let mut users = Table::new(&mut session, &name).unwrap();

        let rows = (0..230)
            .map(|i| {
                vec![
                    Value::from(format!("u{}", i)),
                    Value::from(format!("u{}@x", i)),
                ]
            })
            .collect();
        let frame = Frame::new(vec!["name", "email"], rows).unwrap();
        assert_eq!(users.insert_bulk(&frame, Commit::Immediate).await.unwrap(), 230);
        assert_eq!(users.count(Fields::new()).await.unwrap(), 230);

        users
            .insert(
                Fields::new().with("name", "new").with("email", "new@x"),
                Commit::Deferred,
            )
            .await
            .unwrap();
        let duplicate = users
            .insert(
                Fields::new().with("name", "dup").with("email", "u0@x"),
                Commit::Immediate,
            )
            .await;
        assert!(matches!(duplicate, Err(Error::Database(_))));

        // the deferred insert went with the rollback
        assert_eq!(users.count(Fields::new()).await.unwrap(), 230);
    }
    teardown(session, &name).await;
}

#[tokio::test]
async fn null_into_non_integer_columns() {
    let Some((mut session, name)) = setup("nulls").await else {
        return;
    };
    {
        let mut users = Table::new(&mut session, &name).unwrap();

        users
            .insert(
                Fields::new()
                    .with("name", "nil")
                    .with("active", Value::Null)
                    .with("email", Value::Null),
                Commit::Immediate,
            )
            .await
            .unwrap();
        users
            .update(
                Fields::new().with("active", Value::Null).with("score", Value::Null),
                Fields::new().with("name", "nil"),
                Commit::Immediate,
            )
            .await
            .unwrap();

        let frame = users
            .select(["active", "email", "score"], Fields::new(), Fetch::One)
            .await
            .unwrap();
        assert_eq!(frame.rows(), &[vec![Value::Null, Value::Null, Value::Null]]);
    }
    teardown(session, &name).await;
}
