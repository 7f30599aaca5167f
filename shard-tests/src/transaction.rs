use crate::silent_logs;
use indoc::indoc;
use shard::{Connection, Error, Executor, Result, Shard, Transaction, args, future::FutureExt};
use std::panic::AssertUnwindSafe;

async fn count<C: Connection>(shard: &mut Shard<C>, name: &str) -> i64 {
    shard
        .select_int(
            "SELECT COUNT(*) FROM shard_ledger WHERE name = ?",
            args![name],
        )
        .await
        .expect("Could not count the ledger entries")
        .unwrap_or_default()
}

/// Commit on success, rollback on error, panic and drop.
pub async fn transaction<C: Connection>(shard: &mut Shard<C>) {
    shard
        .execute("DROP TABLE IF EXISTS shard_ledger", args![])
        .await
        .expect("Could not drop shard_ledger");
    shard
        .execute(
            indoc! {"
                CREATE TABLE shard_ledger (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name VARCHAR(32) NOT NULL,
                    amount INTEGER NOT NULL
                )
            "},
            args![],
        )
        .await
        .expect("Could not create shard_ledger");

    let id = shard
        .transact(async |tx| {
            let id = tx
                .insert(
                    "INSERT INTO shard_ledger (name, amount) VALUES (?, ?)",
                    args!["committed", 10],
                )
                .await?;
            tx.update_one(
                "UPDATE shard_ledger SET amount = amount + ? WHERE id = ?",
                args![5, id],
            )
            .await?;
            Ok(id)
        })
        .await
        .expect("The transaction should commit");
    assert_eq!(count(shard, "committed").await, 1);
    assert_eq!(
        shard
            .select_int("SELECT amount FROM shard_ledger WHERE id = ?", args![id])
            .await
            .expect("Could not select the amount"),
        Some(15)
    );

    let error = shard
        .transact(async |tx| -> Result<()> {
            tx.insert_ignore_id(
                "INSERT INTO shard_ledger (name, amount) VALUES (?, ?)",
                args!["failed", 20],
            )
            .await?;
            let seen = tx
                .select_int(
                    "SELECT COUNT(*) FROM shard_ledger WHERE name = ?",
                    args!["failed"],
                )
                .await?;
            assert_eq!(seen, Some(1));
            Err(Error::msg("Insufficient funds"))
        })
        .await
        .expect_err("The body fails");
    assert_eq!(error.to_string(), "Insufficient funds");
    assert_eq!(count(shard, "failed").await, 0);

    silent_logs! {
        let error = shard
            .transact(async |tx| {
                tx.insert_ignore_id(
                    "INSERT INTO shard_ledger (name, amount) VALUES (?, ?)",
                    args!["invalid", 30],
                )
                .await?;
                tx.insert_ignore_id(
                    "INSERT INTO shard_ledger (name, amount) VALUES (?, ?)",
                    args!["invalid", None::<i64>],
                )
                .await
            })
            .await
            .expect_err("The second insert violates NOT NULL");
        assert!(error.root_cause().to_string().contains("NOT NULL"));
    };
    assert_eq!(count(shard, "invalid").await, 0);

    let panic = AssertUnwindSafe(shard.transact(async |tx| -> Result<()> {
        tx.insert_ignore_id(
            "INSERT INTO shard_ledger (name, amount) VALUES (?, ?)",
            args!["panicked", 40],
        )
        .await?;
        panic!("Unexpected state");
    }))
    .catch_unwind()
    .await
    .expect_err("The panic is resumed");
    assert_eq!(panic.downcast_ref::<&str>(), Some(&"Unexpected state"));
    assert_eq!(count(shard, "panicked").await, 0);

    {
        let mut transaction = shard
            .executor()
            .begin()
            .await
            .expect("Could not begin a transaction");
        transaction
            .execute(
                "INSERT INTO shard_ledger (name, amount) VALUES ('dropped', 50)",
                &[],
            )
            .await
            .expect("Could not insert inside the transaction");
    }
    assert_eq!(count(shard, "dropped").await, 0);

    let transaction = shard
        .executor()
        .begin()
        .await
        .expect("Could not begin a transaction");
    transaction
        .commit()
        .await
        .expect("An empty transaction commits");
    assert_eq!(count(shard, "committed").await, 1);
}
