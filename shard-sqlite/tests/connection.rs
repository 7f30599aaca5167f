#[cfg(test)]
mod tests {
    use shard::{Connection, Executor, Shard, Transaction, args};
    use shard_sqlite::SqliteConnection;
    use shard_tests::{init_logs, silent_logs};
    use std::{path::Path, sync::Mutex, time::Duration};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        let mut shard =
            Shard::<SqliteConnection>::connect("readonly", &format!("sqlite://{}?mode=ro", DB_PATH))
                .await
                .expect("Could not open the database");
        assert_eq!(shard.name(), "readonly");
        silent_logs! {
            assert!(
                shard
                    .execute("CREATE TABLE t (id INTEGER)", args![])
                    .await
                    .is_err(),
                "A read only database cannot be written"
            );
        };
        drop(shard);
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH))
                    .await
                    .is_err(),
                "Should not be able to open in read only unexisting database"
            );
        };
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                SqliteConnection::connect("duckdb://some_value")
                    .await
                    .is_err()
            );
            assert!(
                SqliteConnection::connect("sqlite://missing/directory/db.sqlite")
                    .await
                    .is_err()
            );
        };
    }

    #[tokio::test]
    async fn statements() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .expect("Could not open the database");
        connection.ping().await.expect("Ping failed");
        let created = connection
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", &[])
            .await
            .expect("Could not create the table");
        assert_eq!(created.rows_affected, 0);
        let inserted = connection
            .execute("INSERT INTO t (v) VALUES (?), (?)", &args!["a", "b"])
            .await
            .expect("Could not insert");
        assert_eq!(inserted.rows_affected, 2);
        assert_eq!(inserted.last_affected_id, Some(2));
        silent_logs! {
            assert!(
                connection
                    .execute("INSERT INTO t (v) VALUES (?)", &args!["a", "b"])
                    .await
                    .is_err(),
                "Wrong number of parameters"
            );
            assert!(
                connection
                    .execute("SELECT 1; SELECT 2", &[])
                    .await
                    .is_err(),
                "Only one statement at a time"
            );
            assert!(
                connection
                    .execute("INSERT INTO t (v) VALUES (?)", &args![u64::MAX])
                    .await
                    .is_err(),
                "Out of range for a sqlite integer"
            );
        };
        let rows = connection
            .query("SELECT id, v, NULL AS n, x'00ff' AS b, 1.5 AS f FROM t", &[])
            .await
            .expect("Could not query");
        assert_eq!(rows.columns(), ["id", "v", "n", "b", "f"]);
        drop(rows);
        let mut shard = Shard::new("memory", connection)
            .await
            .expect("Could not wrap the connection");
        let mut bytes = Vec::<Vec<u8>>::new();
        shard
            .select(&mut bytes, "SELECT x'00ff' UNION ALL SELECT 'text'", args![])
            .await
            .expect("Could not select the bytes");
        assert_eq!(bytes, [vec![0x00, 0xff], b"text".to_vec()]);
        assert_eq!(
            shard
                .select_string("SELECT 1.5", args![])
                .await
                .expect("Could not select a float"),
            Some("1.5".into())
        );
    }

    #[tokio::test]
    async fn locked_database() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/locked.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        let url = format!("sqlite://{}?mode=rwc", DB_PATH);
        let mut writer = SqliteConnection::connect(&url)
            .await
            .expect("Could not open the writer");
        writer
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[])
            .await
            .expect("Could not create the table");
        let mut other = SqliteConnection::connect(&url)
            .await
            .expect("Could not open the other connection");
        other
            .set_busy_timeout(Duration::from_millis(50))
            .expect("Could not set the busy timeout");
        writer
            .execute("BEGIN IMMEDIATE", &[])
            .await
            .expect("Could not take the write lock");
        silent_logs! {
            let error = other
                .execute("INSERT INTO t (id) VALUES (1)", &[])
                .await
                .expect_err("The database is locked by the writer");
            assert_eq!(error.root_cause().to_string(), "database is locked");
        };
        writer
            .execute("COMMIT", &[])
            .await
            .expect("Could not release the write lock");
        other
            .execute("INSERT INTO t (id) VALUES (1)", &[])
            .await
            .expect("The lock was released");
        drop(other);
        drop(writer);
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
    }

    #[tokio::test]
    async fn failed_commit_rolls_back_on_drop() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .expect("Could not open the database");
        for sql in [
            "PRAGMA foreign_keys = ON",
            "CREATE TABLE parent (id INTEGER PRIMARY KEY)",
            "CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER REFERENCES parent (id) DEFERRABLE INITIALLY DEFERRED)",
        ] {
            connection.execute(sql, &[]).await.expect("Could not set up");
        }
        let mut transaction = connection
            .begin()
            .await
            .expect("Could not begin a transaction");
        transaction
            .execute("INSERT INTO child (id, parent_id) VALUES (1, 99)", &[])
            .await
            .expect("The foreign key is checked at commit");
        silent_logs! {
            let error = transaction
                .commit()
                .await
                .expect_err("The deferred foreign key fails the commit");
            assert!(error.root_cause().to_string().contains("FOREIGN KEY"));
        };
        let mut shard = Shard::new("memory", connection)
            .await
            .expect("Could not wrap the connection");
        assert_eq!(
            shard
                .select_int("SELECT COUNT(*) FROM child", args![])
                .await
                .expect("Could not count"),
            Some(0)
        );
        let transaction = shard
            .executor()
            .begin()
            .await
            .expect("No transaction is left open");
        transaction.rollback().await.expect("Could not roll back");
    }
}
