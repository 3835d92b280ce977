//! End-to-end checks against a live server.
//!
//! Set `DATABASE_URL` to run them; without it every test returns early.

use pgfluent::{Database, Limit, Operator, TableData, Value, inc, now};

async fn try_connect() -> Option<Database> {
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    let mut db = Database::from_client(client);
    db.set_prefix("pgfluent_it_");
    Some(db)
}

async fn recreate(db: &mut Database, table: &str, fields: &[(&str, &str)]) {
    db.prepare(&format!("DROP TABLE IF EXISTS pgfluent_it_{table}"), &[])
        .await
        .unwrap();
    db.create_table(table, fields).await.unwrap();
}

#[tokio::test]
async fn increment_round_trip() {
    let Some(mut db) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    recreate(
        &mut db,
        "counters",
        &[
            ("login", "TEXT NOT NULL"),
            ("login_count", "INT NOT NULL DEFAULT 0"),
            ("updated_at", "TIMESTAMP"),
        ],
    )
    .await;

    let data = TableData::new().set("login", "user1").set("login_count", 5);
    let id = db.insert("counters", &data).await.unwrap().id().unwrap();
    assert_eq!(db.last_insert_id(), Some(id));

    let bump = TableData::new()
        .set("login_count", inc(3))
        .set("updated_at", now(Some("-1h")).unwrap());
    assert!(db.and_where("id", id).update("counters", &bump).await.unwrap());
    assert_eq!(db.count(), 1);

    let value = db
        .and_where("id", id)
        .get_value("counters", "login_count")
        .await
        .unwrap();
    assert_eq!(value, Some(Value::Int(8)));

    assert!(db.drop_table("counters").await.unwrap());
}

#[tokio::test]
async fn in_filter_returns_matching_rows() {
    let Some(mut db) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    recreate(&mut db, "orders", &[("customer_id", "INT NOT NULL")]).await;

    for customer_id in [10, 11, 12, 10] {
        let data = TableData::new().set("customer_id", customer_id);
        assert!(db.insert("orders", &data).await.unwrap().is_ok());
    }

    let rows = db
        .and_where_op("customer_id", Operator::In, vec!["10", "11"])
        .order_by("id", "ASC")
        .unwrap()
        .get("orders", Limit::All)
        .await
        .unwrap();
    let ids: Vec<_> = rows
        .iter()
        .filter_map(|row| row.get("customer_id").and_then(Value::as_i64))
        .collect();
    assert_eq!(ids, vec![10, 11, 10]);

    let rows = db
        .with_total_count()
        .and_where_op("customer_id", Operator::Between, [10, 11])
        .get("orders", 1)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(db.total_count(), 3);

    assert!(db.drop_table("orders").await.unwrap());
}

#[tokio::test]
async fn rollback_discards_insert() {
    let Some(mut db) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    recreate(&mut db, "tx_users", &[("login", "TEXT NOT NULL")]).await;

    db.start_transaction().await.unwrap();
    let data = TableData::new().set("login", "ghost");
    assert!(db.insert("tx_users", &data).await.unwrap().is_ok());
    db.rollback().await.unwrap();

    assert!(!db.and_where("login", "ghost").has("tx_users").await);
    assert!(db.drop_table("tx_users").await.unwrap());
}

#[tokio::test]
async fn unknown_table_fails_to_prepare() {
    let Some(mut db) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let err = db
        .and_where("id", 1)
        .get("does_not_exist", 1)
        .await
        .unwrap_err();
    assert!(err.is_prepare());
    assert!(db.pending().is_empty());
    assert!(db.ping().await);
}
