//! Basic usage example for pgfluent
//!
//! Run with: cargo run --example basic -p pgfluent
//!
//! Set DB_HOST, DB_USER, DB_PASS and DB_NAME in a .env file or the environment.

use pgfluent::{Database, Operator, OrmError, TableData, inc, now};

#[tokio::main]
async fn main() -> Result<(), OrmError> {
    let mut db = Database::from_env().await?;
    db.set_trace(true, "");

    db.prepare("DROP TABLE IF EXISTS example_users", &[]).await?;
    db.create_table(
        "example_users",
        &[
            ("login", "TEXT NOT NULL"),
            ("customer_id", "INT NOT NULL"),
            ("login_count", "INT NOT NULL DEFAULT 0"),
            ("last_login", "TIMESTAMP"),
        ],
    )
    .await?;

    for (login, customer_id) in [("alice", 10), ("bob", 11), ("carol", 12)] {
        let data = TableData::new()
            .set("login", login)
            .set("customer_id", customer_id);
        let result = db.insert("example_users", &data).await?;
        println!("inserted {login}: {result:?}");
    }

    let data = TableData::new()
        .set("login_count", inc(1))
        .set("last_login", now(None)?);
    db.and_where("login", "alice")
        .update("example_users", &data)
        .await?;
    println!("updated {} row(s)", db.count());

    let users = db
        .and_where_op("customer_id", Operator::In, vec![10, 11])
        .order_by("login", "ASC")?
        .get("example_users", 10)
        .await?;
    for user in &users {
        println!("{}", serde_json::to_string(user).unwrap_or_default());
    }

    db.drop_table("example_users").await?;

    for entry in db.trace() {
        println!("{:?} {:>8.3?} {}", entry.query_type, entry.elapsed, entry.query);
    }
    Ok(())
}
