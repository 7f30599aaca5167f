use crate::silent_logs;
use indoc::indoc;
use shard::{Connection, Entity, Info, Shard, args};

#[derive(Entity, Default, Debug, PartialEq)]
struct Item {
    id: u32,
    label: String,
    position: i32,
    price: Option<u64>,
}

async fn setup<C: Connection>(shard: &mut Shard<C>) {
    shard
        .execute("DROP TABLE IF EXISTS shard_items", args![])
        .await
        .expect("Could not drop shard_items");
    shard
        .execute(
            indoc! {"
                CREATE TABLE shard_items (
                    id INTEGER PRIMARY KEY,
                    label VARCHAR(32) NOT NULL,
                    position INTEGER NOT NULL,
                    price INTEGER
                )
            "},
            args![],
        )
        .await
        .expect("Could not create shard_items");
    for (id, label, position, price) in [
        (1, "first", 40, Some(100)),
        (2, "second", 10, None),
        (3, "third", 30, Some(300)),
        (4, "fourth", 20, Some(400)),
        (5, "fifth", 50, None),
    ] {
        shard
            .insert_ignore_id(
                "INSERT INTO shard_items (id, label, position, price) VALUES (?, ?, ?, ?)",
                args![id, label, position, price],
            )
            .await
            .expect("Could not insert an item");
    }
}

/// Vectors of entities and of scalars, and scalar fetches.
pub async fn select<C: Connection>(shard: &mut Shard<C>) {
    setup(shard).await;

    let mut items = Vec::<Item>::new();
    shard
        .select(
            &mut items,
            "SELECT * FROM shard_items ORDER BY position",
            args![],
        )
        .await
        .expect("Could not select the items");
    assert_eq!(items.len(), 5);
    assert_eq!(
        items.iter().map(|v| v.id).collect::<Vec<_>>(),
        [2, 4, 3, 1, 5]
    );
    assert_eq!(
        items[0],
        Item {
            id: 2,
            label: "second".into(),
            position: 10,
            price: None,
        }
    );
    assert_eq!(items[1].price, Some(400));

    let mut labels = Vec::<String>::new();
    shard
        .select(
            &mut labels,
            "SELECT label FROM shard_items WHERE position > ? ORDER BY id DESC",
            args![25],
        )
        .await
        .expect("Could not select the labels");
    assert_eq!(labels, ["fifth", "third", "first"]);

    let mut prices = Vec::<Option<u64>>::new();
    shard
        .select(&mut prices, "SELECT price FROM shard_items ORDER BY id", args![])
        .await
        .expect("Could not select the prices");
    assert_eq!(prices, [Some(100), None, Some(300), Some(400), None]);

    let mut nothing = Vec::<Item>::new();
    shard
        .select(&mut nothing, "SELECT * FROM shard_items WHERE id > 100", args![])
        .await
        .expect("Could not select an empty result");
    assert!(nothing.is_empty());

    silent_logs! {
        let error = shard
            .select(&mut labels, "SELECT label FROM shard_items", args![])
            .await
            .expect_err("The destination is not empty");
        assert_eq!(error.root_cause().to_string(), "Select expects items to be empty");
        assert_eq!(labels.len(), 3);

        let mut pairs = Vec::<i64>::new();
        let error = shard
            .select(&mut pairs, "SELECT id, position FROM shard_items", args![])
            .await
            .expect_err("Two columns cannot fill a vector of scalars");
        assert_eq!(
            error.root_cause().to_string(),
            "Select expected single column in select statement for slice of non-struct values"
        );
        assert!(pairs.is_empty());

        let mut narrow = Vec::<u8>::new();
        let error = shard
            .select(&mut narrow, "SELECT price FROM shard_items ORDER BY id", args![])
            .await
            .expect_err("300 does not fit in a u8");
        assert_eq!(
            error.root_cause().to_string(),
            "Bad row value for column price: u8"
        );
        assert_eq!(narrow, [100, 0]);
        let info = error.downcast_ref::<Info>().expect("Info is attached");
        assert_eq!(info.get("Query"), Some("SELECT price FROM shard_items ORDER BY id"));
    };

    assert_eq!(
        shard
            .select_int("SELECT COUNT(*) FROM shard_items", args![])
            .await
            .expect("Could not count"),
        Some(5)
    );
    assert_eq!(
        shard
            .select_uint("SELECT MAX(price) FROM shard_items", args![])
            .await
            .expect("Could not select the maximum"),
        Some(400)
    );
    assert_eq!(
        shard
            .select_value::<Option<u64>>("SELECT price FROM shard_items WHERE id = ?", args![2])
            .await
            .expect("Could not select a NULL price"),
        Some(None)
    );
    assert_eq!(
        shard
            .select_int("SELECT id, label FROM shard_items WHERE id > 100", args![])
            .await
            .expect("No rows is not found whatever the columns"),
        None
    );
    assert_eq!(
        shard
            .select_string("SELECT label FROM shard_items WHERE id = ?", args![3])
            .await
            .expect("Could not select a label"),
        Some("third".into())
    );
    assert_eq!(
        shard
            .select_string("SELECT label FROM shard_items WHERE id = ?", args![42])
            .await
            .expect("Could not select a missing label"),
        None
    );
    silent_logs! {
        let error = shard
            .select_int("SELECT id FROM shard_items", args![])
            .await
            .expect_err("More than one row");
        assert_eq!(
            error.root_cause().to_string(),
            "queryOne query returned too many rows"
        );
        let error = shard
            .select_uint("SELECT MAX(price) FROM shard_items WHERE id > 100", args![])
            .await
            .expect_err("The maximum of nothing is NULL");
        assert_eq!(
            error.root_cause().to_string(),
            "Unexpected NULL value for column MAX(price)"
        );
        assert!(
            shard
                .select_string("SELECT * FROM shard_missing", args![])
                .await
                .is_err()
        );
    };
}

/// Single entity fetches: zero, one and many rows.
pub async fn select_one<C: Connection>(shard: &mut Shard<C>) {
    setup(shard).await;

    let mut item = None::<Item>;
    assert!(
        !shard
            .select_one(&mut item, "SELECT * FROM shard_items WHERE id = ?", args![99])
            .await
            .expect("Could not select a missing item")
    );
    assert_eq!(item, None);

    assert!(
        shard
            .select_one(&mut item, "SELECT * FROM shard_items WHERE id = ?", args![3])
            .await
            .expect("Could not select an item")
    );
    assert_eq!(
        item,
        Some(Item {
            id: 3,
            label: "third".into(),
            position: 30,
            price: Some(300),
        })
    );

    // The price of item 2 is NULL, the existing one is kept
    assert!(
        shard
            .select_one(&mut item, "SELECT * FROM shard_items WHERE id = ?", args![2])
            .await
            .expect("Could not select into an existing item")
    );
    assert_eq!(
        item,
        Some(Item {
            id: 2,
            label: "second".into(),
            position: 10,
            price: Some(300),
        })
    );

    let mut existing = Some(Item::default());
    assert!(
        !shard
            .select_one(&mut existing, "SELECT * FROM shard_items WHERE id = ?", args![99])
            .await
            .expect("Could not select a missing item")
    );
    assert_eq!(existing, Some(Item::default()));

    silent_logs! {
        let error = shard
            .select_one(&mut None::<Item>, "SELECT * FROM shard_items WHERE position > ?", args![25])
            .await
            .expect_err("Three rows match");
        assert_eq!(error.root_cause().to_string(), "scanOne got multiple rows");
    };
}
