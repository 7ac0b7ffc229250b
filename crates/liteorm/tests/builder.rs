//! End-to-end builder tests against scratch databases.

use std::time::Duration;

use liteorm::{
    Column, Config, Conflict, Database, Direction, Error, FromRow, Row, Values,
};

async fn scratch() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(Config::new(dir.path().join("test.db")))
        .await
        .unwrap();
    (dir, db)
}

/// `t(id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT)`
async fn simple_table(db: &Database) {
    db.builder()
        .table("t")
        .create(vec![
            Column::new("id", "INTEGER").primary_key().auto_increment(),
            Column::new("v", "TEXT"),
        ])
        .await
        .unwrap();
}

async fn insert_v(db: &Database, v: &str) -> i64 {
    db.builder()
        .table("t")
        .insert(Values::new().set("v", v))
        .await
        .unwrap()
}

#[tokio::test]
async fn create_insert_count() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;

    assert_eq!(insert_v(&db, "a").await, 1);
    assert_eq!(insert_v(&db, "b").await, 2);

    let total = db.builder().table("t").count().await.unwrap();
    assert_eq!(total, 2);

    let only_a = db
        .builder()
        .table("t")
        .where_eq("v", "a")
        .count()
        .await
        .unwrap();
    assert_eq!(only_a, 1);
}

#[tokio::test]
async fn first_and_last_follow_the_stated_order() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    insert_v(&db, "a").await;
    insert_v(&db, "b").await;

    // first row under v DESC is the largest value
    let first = db
        .builder()
        .table("t")
        .order_by("v", Direction::Desc)
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.get::<String>("v").unwrap(), "b");

    // last row under v DESC reverses to v ASC
    let last = db
        .builder()
        .table("t")
        .order_by("v", Direction::Desc)
        .last()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(last.get::<String>("v").unwrap(), "a");

    // without ORDER BY, last falls back to reverse insertion order
    let newest = db.builder().table("t").last().await.unwrap().unwrap();
    assert_eq!(newest.get::<String>("v").unwrap(), "b");
}

#[tokio::test]
async fn insert_binds_sorted_keys_to_the_right_columns() {
    let (_dir, db) = scratch().await;
    db.builder()
        .table("kv")
        .create(vec![
            Column::new("b", "INTEGER"),
            Column::new("a", "INTEGER"),
        ])
        .await
        .unwrap();

    db.builder()
        .table("kv")
        .insert(Values::new().set("b", 2i64).set("a", 1i64))
        .await
        .unwrap();

    let row = db.builder().table("kv").first().await.unwrap().unwrap();
    assert_eq!(row.get::<i64>("a").unwrap(), 1);
    assert_eq!(row.get::<i64>("b").unwrap(), 2);
}

#[tokio::test]
async fn total_returns_page_plus_unpaginated_count() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    for i in 0..10 {
        insert_v(&db, &format!("v{i}")).await;
    }

    let rows = db
        .builder()
        .table("t")
        .total()
        .order_by("id", Direction::Asc)
        .limit(3)
        .get()
        .await
        .unwrap();

    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.get::<i64>("total").unwrap(), 10);
    }
    assert_eq!(rows[0].get::<String>("v").unwrap(), "v0");
}

#[tokio::test]
async fn delete_requires_where_or_force() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    insert_v(&db, "a").await;
    insert_v(&db, "b").await;

    let err = db.builder().table("t").delete(false).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(db.builder().table("t").count().await.unwrap(), 2);

    let affected = db
        .builder()
        .table("t")
        .where_eq("v", "a")
        .delete(false)
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let affected = db.builder().table("t").delete(true).await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(db.builder().table("t").count().await.unwrap(), 0);
}

#[tokio::test]
async fn delete_rejects_clauses_sqlite_cannot_express() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    insert_v(&db, "a").await;

    let err = db
        .builder()
        .table("t")
        .where_eq("v", "a")
        .limit(1)
        .delete(false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));

    let err = db
        .builder()
        .table("t")
        .where_eq("v", "a")
        .order_by("v", Direction::Asc)
        .delete(false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));

    // nothing was deleted by either attempt
    assert_eq!(db.builder().table("t").count().await.unwrap(), 1);
}

#[tokio::test]
async fn group_by_skips_silently_where_records() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    insert_v(&db, "a").await;

    let mut builder = db.builder();
    builder.table("t").group_by(&["v", "bad-name"]);
    assert!(builder.errors().is_empty());
    let rows = builder.get().await.unwrap();
    assert_eq!(rows.len(), 1);

    let mut builder = db.builder();
    builder.table("t").where_eq("bad-name", 1i64);
    assert_eq!(builder.errors().len(), 1);
    let err = builder.count().await.unwrap_err();
    assert!(matches!(err, Error::InvalidIdentifier(_)));

    // the failed terminal cleared the builder; it is reusable
    assert!(builder.errors().is_empty());
    assert_eq!(builder.table("t").count().await.unwrap(), 1);
}

#[tokio::test]
async fn conflict_ignore_keeps_existing_row() {
    let (_dir, db) = scratch().await;
    db.builder()
        .table("u")
        .create(vec![
            Column::new("id", "INTEGER").primary_key().auto_increment(),
            Column::new("v", "TEXT").unique(),
        ])
        .await
        .unwrap();

    db.builder()
        .table("u")
        .insert(Values::new().set("v", "a"))
        .await
        .unwrap();

    // duplicate under OR IGNORE succeeds without inserting
    db.builder()
        .table("u")
        .conflict(Conflict::Ignore)
        .insert(Values::new().set("v", "a"))
        .await
        .unwrap();
    assert_eq!(db.builder().table("u").count().await.unwrap(), 1);

    // duplicate without a conflict mode is a constraint violation
    let err = db
        .builder()
        .table("u")
        .insert(Values::new().set("v", "a"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Sqlite(_)));
}

#[tokio::test]
async fn upsert_updates_on_conflict() {
    let (_dir, db) = scratch().await;
    db.builder()
        .table("counters")
        .create(vec![
            Column::new("name", "TEXT").unique(),
            Column::new("hits", "INTEGER").default_value(0i64),
        ])
        .await
        .unwrap();

    db.builder()
        .table("counters")
        .upsert(
            Values::new().set("name", "page").set("hits", 1i64),
            Values::new().set("hits", 5i64),
        )
        .await
        .unwrap();
    db.builder()
        .table("counters")
        .upsert(
            Values::new().set("name", "page").set("hits", 1i64),
            Values::new().set("hits", 5i64),
        )
        .await
        .unwrap();

    assert_eq!(db.builder().table("counters").count().await.unwrap(), 1);
    let row = db
        .builder()
        .table("counters")
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get::<i64>("hits").unwrap(), 5);
}

#[tokio::test]
async fn insert_batch_inserts_all_rows() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;

    let affected = db
        .builder()
        .table("t")
        .insert_batch(vec![
            Values::new().set("v", "a"),
            Values::new().set("v", "b"),
            Values::new().set("v", "c"),
        ])
        .await
        .unwrap();
    assert_eq!(affected, 3);
    assert_eq!(db.builder().table("t").count().await.unwrap(), 3);
}

#[tokio::test]
async fn insert_batch_rejects_mismatched_key_sets() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;

    let err = db
        .builder()
        .table("t")
        .insert_batch(vec![
            Values::new().set("v", "a"),
            Values::new().set("id", 7i64),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(db.builder().table("t").count().await.unwrap(), 0);
}

#[tokio::test]
async fn update_mutators_and_data_compose() {
    let (_dir, db) = scratch().await;
    db.builder()
        .table("stats")
        .create(vec![
            Column::new("name", "TEXT"),
            Column::new("hits", "INTEGER").default_value(0i64),
            Column::new("active", "INTEGER").default_value(1i64),
        ])
        .await
        .unwrap();
    db.builder()
        .table("stats")
        .insert(Values::new().set("name", "a").set("hits", 10i64).set("active", 1i64))
        .await
        .unwrap();

    let affected = db
        .builder()
        .table("stats")
        .increase_by("hits", 5)
        .toggle("active")
        .where_eq("name", "a")
        .update(Values::new().set("name", "b"))
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let row = db.builder().table("stats").first().await.unwrap().unwrap();
    assert_eq!(row.get::<String>("name").unwrap(), "b");
    assert_eq!(row.get::<i64>("hits").unwrap(), 15);
    assert_eq!(row.get::<i64>("active").unwrap(), 0);

    let affected = db
        .builder()
        .table("stats")
        .decrease("hits")
        .update(Values::new())
        .await
        .unwrap();
    assert_eq!(affected, 1);
    let row = db.builder().table("stats").first().await.unwrap().unwrap();
    assert_eq!(row.get::<i64>("hits").unwrap(), 14);
}

#[tokio::test]
async fn update_without_payload_or_mutators_is_an_error() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    let err = db
        .builder()
        .table("t")
        .update(Values::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn joins_assemble_and_dispatch() {
    let (_dir, db) = scratch().await;
    db.builder()
        .table("authors")
        .create(vec![
            Column::new("id", "INTEGER").primary_key().auto_increment(),
            Column::new("name", "TEXT"),
        ])
        .await
        .unwrap();
    db.builder()
        .table("books")
        .create(vec![
            Column::new("id", "INTEGER").primary_key().auto_increment(),
            Column::new("author_id", "INTEGER").references("authors", "id"),
            Column::new("title", "TEXT"),
        ])
        .await
        .unwrap();

    let author = db
        .builder()
        .table("authors")
        .insert(Values::new().set("name", "iris"))
        .await
        .unwrap();
    db.builder()
        .table("books")
        .insert(Values::new().set("author_id", author).set("title", "one"))
        .await
        .unwrap();

    let rows = db
        .builder()
        .table("books")
        .select(&["title"])
        .join("authors", "authors.id = books.author_id")
        .where_eq("title", "one")
        .get()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<String>("title").unwrap(), "one");

    // the empty ON clause only surfaces at the terminal call
    let err = db
        .builder()
        .table("books")
        .join("authors", "")
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn group_by_and_having_filter_groups() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    for v in ["x", "x", "x", "y"] {
        insert_v(&db, v).await;
    }

    let rows = db
        .builder()
        .table("t")
        .select(&["v"])
        .group_by(&["v"])
        .having_raw("COUNT(*) > ?", &[&2i64])
        .get()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<String>("v").unwrap(), "x");
}

#[tokio::test]
async fn typed_decoding_via_from_row() {
    #[derive(Debug, PartialEq)]
    struct Entry {
        id: i64,
        v: String,
    }

    impl FromRow for Entry {
        fn from_row(row: &Row) -> liteorm::Result<Self> {
            Ok(Self {
                id: row.get("id")?,
                v: row.get("v")?,
            })
        }
    }

    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    insert_v(&db, "a").await;
    insert_v(&db, "b").await;

    let entries: Vec<Entry> = db
        .builder()
        .table("t")
        .order_by("id", Direction::Asc)
        .get_as()
        .await
        .unwrap();
    assert_eq!(
        entries,
        vec![
            Entry { id: 1, v: "a".into() },
            Entry { id: 2, v: "b".into() },
        ]
    );

    let first: Option<Entry> = db
        .builder()
        .table("t")
        .where_eq("v", "b")
        .first_as()
        .await
        .unwrap();
    assert_eq!(first, Some(Entry { id: 2, v: "b".into() }));

    let missing: Option<Entry> = db
        .builder()
        .table("t")
        .where_eq("v", "zzz")
        .first_as()
        .await
        .unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn where_in_and_between() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    for v in ["a", "b", "c", "d"] {
        insert_v(&db, v).await;
    }

    let n = db
        .builder()
        .table("t")
        .where_in("v", &["a", "c"])
        .count()
        .await
        .unwrap();
    assert_eq!(n, 2);

    let n = db
        .builder()
        .table("t")
        .where_between("id", 2i64, 3i64)
        .count()
        .await
        .unwrap();
    assert_eq!(n, 2);

    let err = db
        .builder()
        .table("t")
        .where_in::<i64>("id", &[])
        .count()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn generous_timeout_does_not_interfere() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;
    insert_v(&db, "a").await;

    let n = db
        .builder()
        .table("t")
        .timeout(Duration::from_secs(5))
        .count()
        .await
        .unwrap();
    assert_eq!(n, 1);
}

#[tokio::test]
async fn reads_and_writes_share_one_database() {
    let (_dir, db) = scratch().await;
    simple_table(&db).await;

    // interleave writes (write pool) with reads (read pool)
    for i in 0..5i64 {
        insert_v(&db, &format!("v{i}")).await;
        let n = db.builder().table("t").count().await.unwrap();
        assert_eq!(n, i + 1);
    }
}
