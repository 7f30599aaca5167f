use indoc::indoc;
use shard::{Connection, Entity, Shard, args};

#[derive(Entity, Default, Debug, Clone, PartialEq)]
struct Profile {
    id: i64,
    name: String,
    age: u8,
    active: bool,
    tiny: i8,
    small: i16,
    medium: i32,
    big: i64,
    usmall: u16,
    umedium: u32,
    ubig: u64,
    avatar: Vec<u8>,
    nickname: Option<String>,
    #[shard(name = "is_admin")]
    admin: bool,
    #[shard(skip)]
    session: String,
}

const INSERT: &str = indoc! {"
    INSERT INTO shard_profiles
        (name, age, active, tiny, small, medium, big, usmall, umedium, ubig, avatar, nickname, is_admin)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"};

async fn insert<C: Connection>(shard: &mut Shard<C>, profile: &Profile) -> i64 {
    shard
        .insert(
            INSERT,
            args![
                profile.name.as_str(),
                profile.age,
                profile.active,
                profile.tiny,
                profile.small,
                profile.medium,
                profile.big,
                profile.usmall,
                profile.umedium,
                profile.ubig,
                profile.avatar.as_slice(),
                profile.nickname.clone(),
                profile.admin,
            ],
        )
        .await
        .expect("Could not insert a profile")
}

/// Every supported field kind survives a round trip.
pub async fn users<C: Connection>(shard: &mut Shard<C>) {
    shard
        .execute("DROP TABLE IF EXISTS shard_profiles", args![])
        .await
        .expect("Could not drop shard_profiles");
    shard
        .execute(
            indoc! {"
                CREATE TABLE shard_profiles (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name VARCHAR(64) NOT NULL,
                    age INTEGER,
                    active BOOLEAN,
                    tiny INTEGER,
                    small INTEGER,
                    medium INTEGER,
                    big BIGINT,
                    usmall INTEGER,
                    umedium INTEGER,
                    ubig BIGINT,
                    avatar BLOB,
                    nickname VARCHAR(64),
                    is_admin BOOLEAN,
                    session VARCHAR(64)
                )
            "},
            args![],
        )
        .await
        .expect("Could not create shard_profiles");

    let alice = Profile {
        name: "alice".into(),
        age: 30,
        active: true,
        ..Default::default()
    };
    let id = insert(shard, &alice).await;
    let mut found = None::<Profile>;
    assert!(
        shard
            .select_one(&mut found, "SELECT * FROM shard_profiles WHERE id = ?", args![id])
            .await
            .expect("Could not select alice")
    );
    assert_eq!(found, Some(Profile { id, ..alice }));

    let limits = Profile {
        id: 0,
        name: "limits ✓ \"quoted\"".into(),
        age: u8::MAX,
        active: false,
        tiny: i8::MIN,
        small: i16::MIN,
        medium: i32::MIN,
        big: i64::MIN,
        usmall: u16::MAX,
        umedium: u32::MAX,
        ubig: i64::MAX as u64,
        avatar: vec![0, 1, 127, 128, 255, b'\n', 0],
        nickname: Some("lim".into()),
        admin: true,
        session: String::new(),
    };
    let id = insert(shard, &limits).await;
    let mut found = None::<Profile>;
    assert!(
        shard
            .select_one(&mut found, "SELECT * FROM shard_profiles WHERE id = ?", args![id])
            .await
            .expect("Could not select limits")
    );
    assert_eq!(found, Some(Profile { id, ..limits.clone() }));

    let maximums = Profile {
        name: "maximums".into(),
        tiny: i8::MAX,
        small: i16::MAX,
        medium: i32::MAX,
        big: i64::MAX,
        ..limits.clone()
    };
    let id = insert(shard, &maximums).await;
    let mut found = None::<Profile>;
    shard
        .select_one(&mut found, "SELECT * FROM shard_profiles WHERE id = ?", args![id])
        .await
        .expect("Could not select maximums");
    assert_eq!(found, Some(Profile { id, ..maximums }));

    // Empty strings are sent as NULL
    let empty = Profile {
        name: "empty".into(),
        nickname: Some(String::new()),
        ..Default::default()
    };
    let id = insert(shard, &empty).await;
    assert_eq!(
        shard
            .select_int(
                "SELECT COUNT(*) FROM shard_profiles WHERE id = ? AND nickname IS NULL",
                args![id],
            )
            .await
            .expect("Could not count"),
        Some(1)
    );

    // NULL columns leave the fields of a reused instance untouched
    let mut reused = Some(Profile {
        nickname: Some("kept".into()),
        session: "abc".into(),
        ..Default::default()
    });
    assert!(
        shard
            .select_one(&mut reused, "SELECT * FROM shard_profiles WHERE id = ?", args![id])
            .await
            .expect("Could not select into a reused instance")
    );
    let reused = reused.expect("The instance is still there");
    assert_eq!(reused.id, id);
    assert_eq!(reused.name, "empty");
    assert_eq!(reused.nickname.as_deref(), Some("kept"));
    assert_eq!(reused.session, "abc");

    let mut profiles = Vec::<Profile>::new();
    shard
        .select(
            &mut profiles,
            "SELECT * FROM shard_profiles ORDER BY id",
            args![],
        )
        .await
        .expect("Could not select all the profiles");
    assert_eq!(
        profiles.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["alice", "limits ✓ \"quoted\"", "maximums", "empty"]
    );
    assert!(profiles.iter().all(|v| v.session.is_empty()));
    assert_eq!(Profile::columns().len(), 14);
}
