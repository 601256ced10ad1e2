#![cfg(feature = "sqlite")]

use crudkit::{
    Commit, Connection, Error, Fetch, Fields, Frame, Projection, SqliteSession, Table, Value,
};

const USERS: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT UNIQUE,
    active BOOLEAN
)";

async fn session_with(schema: &str) -> SqliteSession {
    let mut session = SqliteSession::in_memory().await.unwrap();
    session.execute_raw(schema).await.unwrap();
    session.commit().await.unwrap();
    session
}

fn user(name: &str, email: &str) -> Fields {
    Fields::new()
        .with("name", name)
        .with("email", email)
        .with("active", true)
}

#[tokio::test]
async fn insert_then_select_round_trip() {
    let mut session = session_with(USERS).await;
    let mut users = Table::new(&mut session, "users")
        .unwrap()
        .with_columns(["id", "name", "email", "active"]);

    let inserted = users
        .insert(user("Ann", "ann@example.com"), Commit::Immediate)
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let frame = users
        .select(Projection::All, Fields::new().with("name", "Ann"), Fetch::All)
        .await
        .unwrap();
    assert_eq!(frame.len(), 1);
    assert_eq!(frame.value(0, "email").unwrap(), &Value::from("ann@example.com"));
    // no boolean storage class: comes back as an integer
    assert_eq!(frame.value(0, "active").unwrap(), &Value::I64(1));
}

#[tokio::test]
async fn get_id_and_missing_row() {
    let mut session = session_with(USERS).await;
    let mut users = Table::new(&mut session, "users").unwrap();

    users
        .insert(user("Bo", "bo@example.com"), Commit::Immediate)
        .await
        .unwrap();

    let id = users
        .get_id(Fields::new().with("email", "bo@example.com"))
        .await
        .unwrap();
    assert_eq!(id, Value::I64(1));

    let missing = users
        .get_id(Fields::new().with("email", "nobody@example.com"))
        .await;
    assert!(matches!(missing, Err(Error::EmptyResult { .. })));
}

#[tokio::test]
async fn bulk_insert_adds_every_row() {
    let mut session = session_with(USERS).await;
    let mut users = Table::new(&mut session, "users")
        .unwrap()
        .with_bulk_page_size(7);

    let rows = (0..250)
        .map(|i| {
            vec![
                Value::from(format!("user{}", i)),
                Value::from(format!("u{}@example.com", i)),
            ]
        })
        .collect();
    let frame = Frame::new(vec!["name", "email"], rows).unwrap();

    let before = users.count(Fields::new()).await.unwrap();
    let inserted = users.insert_bulk(&frame, Commit::Immediate).await.unwrap();
    let after = users.count(Fields::new()).await.unwrap();

    assert_eq!(inserted, 250);
    assert_eq!(after - before, 250);

    let stored = users
        .select(["name", "email"], Fields::new(), Fetch::All)
        .await
        .unwrap();
    assert_eq!(stored.columns(), frame.columns());
    assert_eq!(stored.rows(), frame.rows());
}

#[tokio::test]
async fn update_and_delete_with_and_without_filter() {
    let mut session = session_with(USERS).await;
    let mut users = Table::new(&mut session, "users").unwrap();
    for (name, email) in [("a", "a@x"), ("b", "b@x"), ("c", "c@x")] {
        users.insert(user(name, email), Commit::Immediate).await.unwrap();
    }

    let updated = users
        .update(
            Fields::new().with("active", false),
            Fields::new().with("name", "b"),
            Commit::Immediate,
        )
        .await
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(users.count(Fields::new().with("active", false)).await.unwrap(), 1);

    let updated = users
        .update(Fields::new().with("active", true), Fields::new(), Commit::Immediate)
        .await
        .unwrap();
    assert_eq!(updated, 3);

    let deleted = users
        .delete(Fields::new().with("name", "a"), Commit::Immediate)
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(users.count(Fields::new()).await.unwrap(), 2);

    let deleted = users.delete(Fields::new(), Commit::Immediate).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(users.count(Fields::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn failure_rolls_back_deferred_work() {
    let mut session = session_with(USERS).await;
    let mut users = Table::new(&mut session, "users").unwrap();

    users
        .insert(user("first", "dup@example.com"), Commit::Deferred)
        .await
        .unwrap();
    let result = users
        .insert(user("second", "dup@example.com"), Commit::Immediate)
        .await;

    assert!(result.as_ref().is_err_and(Error::is_database));
    assert_eq!(users.count(Fields::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn deferred_commit() {
    let mut session = session_with(USERS).await;
    {
        let mut users = Table::new(&mut session, "users").unwrap();
        users
            .insert(user("kept", "kept@example.com"), Commit::Deferred)
            .await
            .unwrap();
        users.commit().await.unwrap();

        users
            .insert(user("dropped", "dropped@example.com"), Commit::Deferred)
            .await
            .unwrap();
        users.rollback().await.unwrap();
    }

    let mut users = Table::new(&mut session, "users").unwrap();
    let names = users.select(["name"], Fields::new(), Fetch::All).await.unwrap();
    assert_eq!(names.rows(), &[vec![Value::from("kept")]]);
}

#[tokio::test]
async fn odd_identifiers_and_hostile_values() {
    let mut session = session_with(
        "CREATE TABLE \"order\"\"items\" (\"select\" TEXT, \"two words\" INTEGER)",
    )
    .await;
    let mut table = Table::new(&mut session, "order\"items").unwrap();

    let hostile = "x'); DROP TABLE \"order\"\"items\"; --";
    table
        .insert(
            Fields::new().with("select", hostile).with("two words", 2),
            Commit::Immediate,
        )
        .await
        .unwrap();

    let frame = table
        .select(["select", "two words"], Fields::new().with("two words", 2), Fetch::One)
        .await
        .unwrap();
    assert_eq!(frame.value(0, "select").unwrap(), &Value::from(hostile));
    assert_eq!(frame.value(0, "two words").unwrap(), &Value::I64(2));
}

#[tokio::test]
async fn unknown_column_is_a_database_error() {
    let mut session = session_with(USERS).await;
    let mut users = Table::new(&mut session, "users").unwrap();

    users
        .insert(user("a", "a@x"), Commit::Immediate)
        .await
        .unwrap();

    let result = users.select(["nope"], Fields::new(), Fetch::All).await;
    assert!(matches!(result, Err(Error::Database(_))));

    // the session is usable after the rollback
    assert_eq!(users.count(Fields::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn misspelled_filter_column_touches_nothing() {
    let mut session = session_with(USERS).await;
    let mut users = Table::new(&mut session, "users").unwrap();
    for (name, email) in [("a", "a@x"), ("b", "b@x"), ("c", "c@x")] {
        users.insert(user(name, email), Commit::Immediate).await.unwrap();
    }

    let deleted = users
        .delete(Fields::new().with("nmae", "nmae"), Commit::Immediate)
        .await;
    assert!(matches!(deleted, Err(Error::Database(_))));

    let updated = users
        .update(
            Fields::new().with("active", false),
            Fields::new().with("nmae", "nmae"),
            Commit::Immediate,
        )
        .await;
    assert!(matches!(updated, Err(Error::Database(_))));

    assert_eq!(users.count(Fields::new()).await.unwrap(), 3);
    assert_eq!(users.count(Fields::new().with("active", true)).await.unwrap(), 3);
}

#[tokio::test]
async fn frame_serializes_records() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct User {
        name: String,
        email: String,
    }

    let mut session = session_with(USERS).await;
    let mut users = Table::new(&mut session, "users").unwrap();
    users
        .insert(user("Cy", "cy@example.com"), Commit::Immediate)
        .await
        .unwrap();

    let frame = users
        .select(["name", "email"], Fields::new(), Fetch::All)
        .await
        .unwrap();
    let records: Vec<User> = frame.deserialize().unwrap();
    assert_eq!(
        records,
        vec![User {
            name: "Cy".into(),
            email: "cy@example.com".into()
        }]
    );
}
