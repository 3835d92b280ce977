use super::*;
use crate::builder::{Operator, inc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
enum Reply {
    Rows(Vec<ResultRow>),
    Affected(u64),
    Fail(&'static str),
}

/// Records every statement and answers from a queue of canned replies.
#[derive(Default)]
struct MockClient {
    statements: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl MockClient {
    fn replying(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            statements: Arc::default(),
            replies: Mutex::new(replies.into_iter().collect()),
        }
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
    }

    fn next_reply(&self) -> Option<Reply> {
        self.replies.lock().unwrap().pop_front()
    }

    fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.statements.lock().unwrap().clone()
    }

    /// Statement log that outlives the client.
    fn log(&self) -> Arc<Mutex<Vec<(String, Vec<Value>)>>> {
        Arc::clone(&self.statements)
    }

    fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|(sql, _)| sql).collect()
    }
}

impl DbClient for MockClient {
    type Statement = String;

    async fn prepare(&self, sql: &str) -> OrmResult<String> {
        if sql.contains("missing_table") {
            return Err(OrmError::prepare(sql, "relation \"missing_table\" does not exist"));
        }
        Ok(sql.to_string())
    }

    async fn query(&self, stmt: &String, params: &[Value]) -> OrmResult<Vec<ResultRow>> {
        self.record(stmt, params);
        match self.next_reply() {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Affected(_)) | None => Ok(Vec::new()),
            Some(Reply::Fail(message)) => Err(OrmError::Execution(message.to_string())),
        }
    }

    async fn execute(&self, stmt: &String, params: &[Value]) -> OrmResult<u64> {
        self.record(stmt, params);
        match self.next_reply() {
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Rows(rows)) => Ok(rows.len() as u64),
            None => Ok(0),
            Some(Reply::Fail(message)) => Err(OrmError::Execution(message.to_string())),
        }
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        self.record(sql, &[]);
        Ok(())
    }
}

fn row(pairs: &[(&str, Value)]) -> ResultRow {
    pairs.iter().cloned().collect()
}

fn db(replies: impl IntoIterator<Item = Reply>) -> Database<MockClient> {
    Database::from_client(MockClient::replying(replies))
}

fn mock(db: &Database<MockClient>) -> &MockClient {
    db.client().unwrap()
}

#[tokio::test]
async fn get_renders_binds_and_resets() {
    let mut db = db([Reply::Rows(vec![row(&[("id", Value::Int(1))])])]);

    let rows = db
        .and_where("id", 1)
        .order_by("id", "desc")
        .unwrap()
        .get("users", 10)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(db.count(), 1);
    assert_eq!(
        mock(&db).statements(),
        vec![(
            "SELECT * FROM users WHERE id = $1 ORDER BY id DESC LIMIT 10".to_string(),
            vec![Value::Int(1)]
        )]
    );
    assert!(db.pending().is_empty());
}

#[tokio::test]
async fn prefix_applies_to_tables_and_joins() {
    let mut db = Database::with_config(MockClient::default(), DbConfig::default().prefix("t_"));

    db.join("users u", "p.customer_id = u.id", "LEFT")
        .unwrap()
        .get_columns("products p", (2, 4), "u.login")
        .await
        .unwrap();

    assert_eq!(
        mock(&db).sql(),
        vec!["SELECT u.login FROM t_products p LEFT JOIN t_users u ON p.customer_id = u.id \
              LIMIT 2 OFFSET 4"]
    );
    assert_eq!(db.prefix(), "t_");
}

#[tokio::test]
async fn build_failure_resets_pending_without_executing() {
    let mut db = db([]);
    db.and_where_op("id", Operator::Between, [1]).label("broken");

    let err = db.get("users", Limit::All).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(db.pending().is_empty());
    assert!(mock(&db).statements().is_empty());
}

#[tokio::test]
async fn prepare_failure_is_returned_and_resets() {
    let mut db = db([]);
    db.and_where("id", 1);

    let err = db.get("missing_table", 1).await.unwrap_err();
    assert!(err.is_prepare());
    assert!(db.pending().is_empty());
    assert!(db.last_error().unwrap().contains("does not exist"));
}

#[tokio::test]
async fn execution_failure_is_recorded() {
    let mut db = db([Reply::Fail("deadlock detected"), Reply::Fail("disk full")]);

    let rows = db.and_where("id", 1).get("users", 1).await.unwrap();
    assert!(rows.is_empty());
    assert!(db.last_error().unwrap().contains("deadlock detected"));
    assert!(db.pending().is_empty());

    let data = TableData::new().set("active", false);
    let updated = db.and_where("id", 1).update("users", &data).await.unwrap();
    assert!(!updated);
    assert!(db.last_error().unwrap().contains("disk full"));
}

#[tokio::test]
async fn last_error_clears_on_next_statement() {
    let mut db = db([Reply::Fail("boom"), Reply::Rows(Vec::new())]);
    db.get("users", 1).await.unwrap();
    assert!(db.last_error().is_some());
    db.get("users", 1).await.unwrap();
    assert_eq!(db.last_error(), None);
}

#[tokio::test]
async fn raw_prepare_returns_execution_errors() {
    let mut db = db([
        Reply::Rows(vec![row(&[("n", Value::Int(2))])]),
        Reply::Fail("division by zero"),
    ]);

    let rows = db
        .prepare("SELECT ? + ? AS n", &[Value::Int(1), Value::Int(1)])
        .await
        .unwrap();
    assert_eq!(rows[0].get("n"), Some(&Value::Int(2)));
    assert_eq!(mock(&db).sql()[0], "SELECT $1 + $2 AS n");

    let err = db.prepare("SELECT 1 / 0", &[]).await.unwrap_err();
    assert!(matches!(err, OrmError::Execution(ref m) if m == "division by zero"));
}

#[tokio::test]
async fn insert_returns_primary_key() {
    let mut db = db([Reply::Rows(vec![row(&[
        ("id", Value::Int(5)),
        ("login", Value::from("user1")),
    ])])]);

    let data = TableData::new()
        .set("login", "user1")
        .set("login_count", inc(1));
    let result = db.insert("users", &data).await.unwrap();

    assert_eq!(result, InsertResult::Id(5));
    assert_eq!(db.last_insert_id(), Some(5));
    assert_eq!(
        mock(&db).sql(),
        vec!["INSERT INTO users (login, login_count) VALUES ($1, 1) RETURNING *"]
    );
}

#[tokio::test]
async fn insert_uses_configured_primary_key() {
    let config = DbConfig::default().primary_key("user_id");
    let mut db = Database::with_config(
        MockClient::replying([
            Reply::Rows(vec![row(&[("id", Value::Int(9)), ("user_id", Value::Int(3))])]),
            Reply::Rows(vec![row(&[("user_id", Value::Null)])]),
        ]),
        config,
    );

    let data = TableData::new().set("login", "a");
    assert_eq!(db.insert("users", &data).await.unwrap(), InsertResult::Id(3));
    assert_eq!(db.insert("users", &data).await.unwrap(), InsertResult::Inserted);
}

#[tokio::test]
async fn insert_ignore_conflict_reports_failure() {
    let mut db = db([Reply::Rows(Vec::new())]);

    let data = TableData::new().set("id", 1).set("name", "dup");
    let result = db
        .set_query_option("IGNORE")
        .unwrap()
        .insert("test", &data)
        .await
        .unwrap();

    assert_eq!(result, InsertResult::Failed);
    assert!(mock(&db).sql()[0].ends_with("ON CONFLICT DO NOTHING RETURNING *"));
    assert!(db.pending().is_empty());
}

#[tokio::test]
async fn total_count_runs_follow_up_query() {
    let mut db = db([
        Reply::Rows(vec![row(&[("id", Value::Int(1))]), row(&[("id", Value::Int(2))])]),
        Reply::Rows(vec![row(&[("count", Value::Int(7))])]),
    ]);

    let rows = db
        .with_total_count()
        .and_where("active", true)
        .order_by("id", "ASC")
        .unwrap()
        .get("users", 2)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(db.count(), 2);
    assert_eq!(db.total_count(), 7);
    assert_eq!(
        mock(&db).sql(),
        vec![
            "SELECT * FROM users WHERE active = $1 ORDER BY id ASC LIMIT 2",
            "SELECT COUNT(*) FROM (SELECT * FROM users WHERE active = $1) AS found_rows",
        ]
    );
}

#[tokio::test]
async fn total_count_resets_on_the_next_select() {
    let mut db = db([
        Reply::Rows(vec![row(&[("id", Value::Int(1))])]),
        Reply::Rows(vec![row(&[("count", Value::Int(50))])]),
        Reply::Rows(vec![row(&[("id", Value::Int(9))])]),
    ]);

    db.with_total_count().get("users", 1).await.unwrap();
    assert_eq!(db.total_count(), 50);

    db.get("other", 1).await.unwrap();
    assert_eq!(db.total_count(), 0);
}

#[tokio::test]
async fn failed_total_count_keeps_the_select_result() {
    let mut db = db([
        Reply::Rows(vec![row(&[("id", Value::Int(1))])]),
        Reply::Fail("count boom"),
    ]);
    db.set_trace(true, "");

    let rows = db
        .with_total_count()
        .and_where("id", 1)
        .get("users", 1)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(db.count(), 1);
    assert_eq!(db.total_count(), 0);
    assert_eq!(db.last_error(), None);
    assert_eq!(db.last_query(), "SELECT * FROM users WHERE id = '1' LIMIT 1");
    assert_eq!(mock(&db).sql().len(), 2);
    assert_eq!(db.trace().len(), 1);
    assert_eq!(db.trace()[0].query_type, QueryType::Select);
}

#[tokio::test]
async fn total_count_adds_a_single_trace_entry() {
    let mut db = db([
        Reply::Rows(vec![row(&[("id", Value::Int(1))])]),
        Reply::Rows(vec![row(&[("count", Value::Int(3))])]),
    ]);
    db.set_trace(true, "");

    db.with_total_count().get("users", 1).await.unwrap();

    assert_eq!(db.total_count(), 3);
    assert_eq!(db.trace().len(), 1);
    assert_eq!(db.trace()[0].caller, "Database::get()");
    assert!(!db.trace()[0].query.contains("COUNT(*)"));
}

#[tokio::test]
async fn update_resets_pending_state() {
    let mut db = db([Reply::Affected(1), Reply::Fail("update boom")]);
    let data = TableData::new().set("active", true);

    assert!(db.and_where("id", 1).label("first").update("users", &data).await.unwrap());
    assert!(db.pending().is_empty());

    assert!(!db.and_where("id", 2).update("users", &data).await.unwrap());
    assert_eq!(db.last_error(), Some("Database execution failed: update boom"));
    assert!(db.pending().is_empty());
}

#[tokio::test]
async fn delete_resets_pending_state() {
    let mut db = db([Reply::Affected(2), Reply::Fail("delete boom")]);

    assert!(db.and_where("active", false).delete("users", None::<u64>).await.unwrap());
    assert!(db.pending().is_empty());

    assert!(!db.and_where("id", 2).delete("users", 1).await.unwrap());
    assert!(db.last_error().is_some());
    assert!(db.pending().is_empty());
}

#[tokio::test]
async fn drop_table_resets_pending_state() {
    let mut db = db([Reply::Affected(0), Reply::Fail("drop boom")]);

    assert!(db.label("cleanup").drop_table("users").await.unwrap());
    assert!(db.pending().is_empty());

    assert!(!db.label("cleanup").drop_table("users").await.unwrap());
    assert!(db.last_error().is_some());
    assert!(db.pending().is_empty());
}

#[tokio::test]
async fn update_with_order_by_fails_before_sending() {
    let mut db = db([]);
    let data = TableData::new().set("a", 1);

    let err = db
        .and_where("id", 1)
        .order_by("id", "DESC")
        .unwrap()
        .group_by("x")
        .update("users", &data)
        .await
        .unwrap_err();

    assert!(matches!(err, OrmError::Validation(_)));
    assert!(mock(&db).sql().is_empty());
    assert!(db.pending().is_empty());
}

#[tokio::test]
async fn get_value_aliases_the_column() {
    let mut db = db([Reply::Rows(vec![row(&[("retval", Value::from("user1"))])])]);

    let value = db
        .and_where("id", 1)
        .get_value("users", "login")
        .await
        .unwrap();

    assert_eq!(value, Some(Value::from("user1")));
    assert_eq!(
        mock(&db).sql(),
        vec!["SELECT login AS retval FROM users WHERE id = $1 LIMIT 1"]
    );
}

#[tokio::test]
async fn get_values_collects_column() {
    let mut db = db([Reply::Rows(vec![
        row(&[("retval", Value::Int(1))]),
        row(&[("retval", Value::Int(2))]),
    ])]);

    let values = db.get_values("users", "id", 5).await.unwrap();
    assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
}

#[tokio::test]
async fn get_one_returns_first_row() {
    let mut db = db([Reply::Rows(vec![row(&[("login", Value::from("a"))])]), Reply::Rows(Vec::new())]);

    let first = db.get_one("users", "login").await.unwrap();
    assert_eq!(first.unwrap().get("login"), Some(&Value::from("a")));
    assert_eq!(db.get_one("users", "").await.unwrap(), None);
    assert_eq!(
        mock(&db).sql(),
        vec!["SELECT login FROM users LIMIT 1", "SELECT * FROM users LIMIT 1"]
    );
}

#[tokio::test]
async fn has_treats_errors_as_false() {
    let mut db = db([
        Reply::Rows(vec![row(&[("?column?", Value::Int(1))])]),
        Reply::Rows(Vec::new()),
        Reply::Fail("boom"),
    ]);

    assert!(db.and_where("login", "user1").has("users").await);
    assert!(!db.and_where("login", "nobody").has("users").await);
    assert!(!db.has("users").await);
    assert!(!db.and_where_op("id", Operator::Between, 1).has("users").await);
    assert!(db.pending().is_empty());
}

#[tokio::test]
async fn query_appends_pending_clauses() {
    let mut db = db([]);
    db.and_where("active", true)
        .query("SELECT login FROM users", 2)
        .await
        .unwrap();

    assert_eq!(
        mock(&db).sql(),
        vec!["SELECT login FROM users WHERE active = $1 LIMIT 2"]
    );
}

#[tokio::test]
async fn delete_reports_removed_rows() {
    let mut db = db([Reply::Affected(2), Reply::Affected(0)]);

    assert!(db.and_where("id", op_gt(5)).delete("users", 2).await.unwrap());
    assert_eq!(db.count(), 2);
    assert!(!db.delete("users", Limit::All).await.unwrap());
    assert_eq!(
        mock(&db).sql(),
        vec![
            "DELETE FROM users WHERE ctid IN (SELECT ctid FROM users WHERE id > $1 LIMIT 2)",
            "DELETE FROM users",
        ]
    );
}

fn op_gt(n: i64) -> crate::builder::Operand {
    crate::builder::op(Operator::Gt, n)
}

#[tokio::test]
async fn update_counts_affected_rows() {
    let mut db = db([Reply::Affected(3)]);

    let data = TableData::new().set("login_count", inc(1));
    assert!(db.and_where("active", true).update("users", &data).await.unwrap());
    assert_eq!(db.count(), 3);
    assert_eq!(
        mock(&db).sql(),
        vec!["UPDATE users SET login_count = login_count + 1 WHERE active = $1"]
    );
}

#[tokio::test]
async fn drop_and_create_table() {
    let mut db = db([]);
    db.set_prefix("t_");

    db.create_table("users", &[("login", "TEXT NOT NULL")])
        .await
        .unwrap();
    assert!(db.drop_table("users").await.unwrap());
    assert_eq!(
        mock(&db).sql(),
        vec![
            "CREATE TABLE t_users (id SERIAL PRIMARY KEY, login TEXT NOT NULL)",
            "DROP TABLE t_users",
        ]
    );
}

#[tokio::test]
async fn last_query_shows_values() {
    let mut db = db([]);
    db.and_where("login", "o'brien")
        .and_where("active", true)
        .get("users", Limit::All)
        .await
        .unwrap();

    assert_eq!(
        db.last_query(),
        "SELECT * FROM users WHERE login = 'o''brien' AND active = '1'"
    );
}

#[tokio::test]
async fn trace_records_caller_and_type() {
    let mut db = db([]);
    db.set_trace(true, "/srv/app/");

    db.label("/srv/app/users.rs load")
        .and_where("id", 1)
        .get("users", 1)
        .await
        .unwrap();
    db.trace_caller().delete("users", Limit::All).await.unwrap();

    let trace = db.trace();
    assert_eq!(trace.len(), 2);
    assert_eq!(trace[0].caller, "Database::get() >> users.rs load");
    assert_eq!(trace[0].query, "SELECT * FROM users WHERE id = '1' LIMIT 1");
    assert_eq!(trace[0].query_type, QueryType::Select);
    assert!(trace[1].caller.starts_with("Database::delete() >> file \""));
    assert!(trace[1].caller.contains("line #"));
    assert_eq!(trace[1].query_type, QueryType::Delete);

    db.clear_trace();
    assert!(db.trace().is_empty());
}

#[tokio::test]
async fn trace_is_off_by_default() {
    let mut db = db([]);
    db.get("users", 1).await.unwrap();
    assert!(db.trace().is_empty());
}

#[tokio::test]
async fn transactions_do_not_nest() {
    let mut db = db([]);

    db.start_transaction().await.unwrap();
    assert!(db.in_transaction());
    assert!(db.start_transaction().await.is_err());
    db.commit().await.unwrap();
    assert!(db.commit().await.is_err());

    db.start_transaction().await.unwrap();
    db.rollback().await.unwrap();
    assert!(!db.in_transaction());

    assert_eq!(mock(&db).sql(), vec!["BEGIN", "COMMIT", "BEGIN", "ROLLBACK"]);
}

#[tokio::test]
async fn close_rolls_back_open_transaction() {
    let mut db = db([]);
    let log = mock(&db).log();
    db.start_transaction().await.unwrap();
    assert!(db.ping().await);

    db.close().await.unwrap();
    assert!(db.client().is_none());
    assert!(!db.in_transaction());
    assert!(!db.ping().await);

    let sql: Vec<String> = log.lock().unwrap().iter().map(|(s, _)| s.clone()).collect();
    assert_eq!(sql, vec!["BEGIN", "SELECT 1", "ROLLBACK"]);

    db.and_where("id", 1);
    let err = db.get("users", 1).await.unwrap_err();
    assert!(matches!(err, OrmError::Connection(_)));
    assert!(db.pending().is_empty());
}

#[test]
fn escape_doubles_quotes() {
    let db = db([]);
    assert_eq!(db.escape("it's"), "it''s");
}

#[test]
fn insert_result_helpers() {
    assert_eq!(InsertResult::Id(3).id(), Some(3));
    assert!(InsertResult::Inserted.is_ok());
    assert!(!InsertResult::Failed.is_ok());
}
