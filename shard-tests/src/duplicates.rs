use crate::silent_logs;
use indoc::indoc;
use shard::{Connection, Info, Shard, args};

const CREATE: &str = indoc! {"
    CREATE TABLE shard_tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(32) NOT NULL,
        uses INTEGER NOT NULL DEFAULT 0
    )
"};
const INDEX: &str = "CREATE UNIQUE INDEX shard_tags_name ON shard_tags (name)";
const INSERT: &str = "INSERT INTO shard_tags (name) VALUES (?)";

/// Idempotent schema changes and inserts, row count assertions.
pub async fn duplicates<C: Connection>(shard: &mut Shard<C>) {
    shard
        .execute("DROP TABLE IF EXISTS shard_tags", args![])
        .await
        .expect("Could not drop shard_tags");
    assert!(
        shard
            .exec_ignore_duplicate_error(CREATE, args![])
            .await
            .expect("Could not create shard_tags")
            .is_some()
    );
    silent_logs! {
        assert_eq!(
            shard
                .exec_ignore_duplicate_error(CREATE, args![])
                .await
                .expect("The table exists already"),
            None
        );
    };
    shard
        .exec_ignore_duplicate_error(INDEX, args![])
        .await
        .expect("Could not create the index");
    silent_logs! {
        shard
            .exec_ignore_duplicate_error(INDEX, args![])
            .await
            .expect("The index exists already");
    };

    for name in ["rust", "sql", "async"] {
        shard
            .insert_ignore_duplicates(INSERT, args![name])
            .await
            .expect("Could not insert a tag");
    }
    silent_logs! {
        shard
            .insert_ignore_duplicates(INSERT, args!["rust"])
            .await
            .expect("A duplicate entry is ignored");
        let error = shard
            .insert(INSERT, args!["sql"])
            .await
            .expect_err("A plain insert reports the duplicate");
        assert!(shard.patterns().is_duplicate_entry_error(&error));
        let info = error.downcast_ref::<Info>().expect("Info is attached");
        assert_eq!(info.get("Query"), Some(INSERT));
        assert_eq!(info.get("Args"), Some(r#"["sql"]"#));

        let error = shard
            .insert_ignore_duplicates("INSERT INTO shard_missing (name) VALUES (?)", args!["x"])
            .await
            .expect_err("Other errors pass through");
        assert!(!shard.patterns().is_duplicate_exec_error(&error));

        let error = shard
            .insert_ignore_duplicates(INSERT, args![""])
            .await
            .expect_err("The empty name is sent as NULL");
        assert!(!shard.patterns().is_duplicate_entry_error(&error));
    };
    assert_eq!(
        shard
            .select_int("SELECT COUNT(*) FROM shard_tags", args![])
            .await
            .expect("Could not count the tags"),
        Some(3)
    );

    assert_eq!(
        shard
            .update("UPDATE shard_tags SET uses = uses + 1", args![])
            .await
            .expect("Could not update the tags"),
        3
    );
    assert_eq!(
        shard
            .update("UPDATE shard_tags SET uses = 0 WHERE name = ?", args!["none"])
            .await
            .expect("Could not update no tag"),
        0
    );
    shard
        .update_num(
            2,
            "UPDATE shard_tags SET uses = uses + 1 WHERE name <> ?",
            args!["async"],
        )
        .await
        .expect("Two tags are updated");
    shard
        .update_one(
            "UPDATE shard_tags SET uses = uses + 1 WHERE name = ?",
            args!["async"],
        )
        .await
        .expect("One tag is updated");
    silent_logs! {
        let error = shard
            .update_one("UPDATE shard_tags SET uses = 0", args![])
            .await
            .expect_err("Three tags are updated");
        assert_eq!(
            error.root_cause().to_string(),
            "UpdateNum affected unexpected number of rows"
        );
        let info = error.downcast_ref::<Info>().expect("Info is attached");
        assert_eq!(info.get("ExpectedRows"), Some("1"));
        assert_eq!(info.get("AffectedRows"), Some("3"));
        assert!(
            shard
                .update_num(1, "UPDATE shard_tags SET uses = 1 WHERE name = ?", args!["none"])
                .await
                .is_err()
        );
    };
    shard
        .update_num(0, "DELETE FROM shard_tags WHERE name = ?", args!["none"])
        .await
        .expect("No tag is deleted");
}
