//! Integration tests for CollectionStore: CRUD, list queries, persistence
//! and mutation ordering.

mod support;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use erp_store::{
    timestamp, CollectionStore, Collections, FileKeyValueStore, InMemoryKeyValueStore, Latency,
    ListOptions, Record, SortOrder, StoreError, StoreOptions,
};
use serde_json::json;
use support::{item, FlakyKv, RecordingKv};

fn seed() -> Vec<Record> {
    vec![item("a", 5), item("b", 1), item("c", 3)]
}

fn open<K: erp_store::KeyValueStore>(kv: K, seed: Vec<Record>) -> CollectionStore<K> {
    CollectionStore::open(kv, "inventory", seed, StoreOptions::immediate()).unwrap()
}

fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().filter_map(Record::id).collect()
}

#[tokio::test]
async fn created_ids_are_unique() {
    let store = open(InMemoryKeyValueStore::new(), Vec::new());

    let mut seen = HashSet::new();
    for n in 0..200 {
        let created = store.create(Record::new().with("n", n)).await.unwrap();
        assert!(seen.insert(created.id().unwrap().to_string()));
    }
    assert_eq!(store.len(), 200);
}

#[tokio::test]
async fn create_then_read_returns_the_record() {
    let store = open(InMemoryKeyValueStore::new(), seed());

    let created = store
        .create(Record::new().with("name", "Desk").with("quantity", 5))
        .await
        .unwrap();
    let id = created.id().unwrap();

    let read = store.read(id).await.unwrap().unwrap();
    assert_eq!(read, created);
    assert_eq!(read.get("name"), Some(&json!("Desk")));
    assert!(store.read("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn update_merges_and_moves_updated_at_forward() {
    let store = open(InMemoryKeyValueStore::new(), Vec::new());
    let created = store
        .create(Record::new().with("name", "Chair").with("quantity", 8))
        .await
        .unwrap();
    let id = created.id().unwrap().to_string();

    let first = store.update(&id, Record::new().with("quantity", 7)).await.unwrap();
    let second = store.update(&id, Record::new().with("status", "low")).await.unwrap();

    assert_eq!(second.get("name"), Some(&json!("Chair")));
    assert_eq!(second.get("quantity"), Some(&json!(7)));
    assert_eq!(second.get("status"), Some(&json!("low")));
    assert_eq!(second.created_at(), created.created_at());

    let created_at = timestamp::parse(created.updated_at().unwrap()).unwrap();
    let first_at = timestamp::parse(first.updated_at().unwrap()).unwrap();
    let second_at = timestamp::parse(second.updated_at().unwrap()).unwrap();
    assert!(first_at > created_at);
    assert!(second_at > first_at);
}

#[tokio::test]
async fn update_of_missing_id_is_not_found() {
    let kv = RecordingKv::new();
    let store = open(kv.clone(), seed());
    let writes = kv.writes();

    let err = store.update("zzz", Record::new().with("x", 1)).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::NotFound {
            collection: "inventory".into(),
            id: "zzz".into(),
        }
    );
    assert_eq!(kv.writes(), writes);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let kv = RecordingKv::new();
    let store = open(kv.clone(), seed());

    assert!(store.remove("b").await.unwrap());
    let writes = kv.writes();
    assert!(store.remove("b").await.unwrap());

    assert_eq!(kv.writes(), writes);
    assert_eq!(ids(&store.records()), vec!["a", "c"]);
    assert_eq!(ids(&kv.persisted("inventory")), vec!["a", "c"]);
}

#[tokio::test]
async fn second_page_of_twenty_five() {
    let records = (1..=25).map(|n| item(&format!("r{n:02}"), n)).collect();
    let store = open(InMemoryKeyValueStore::new(), records);

    let page = store
        .list(ListOptions::new().page(2).page_size(10))
        .await
        .unwrap();

    assert_eq!(page.data.len(), 10);
    assert_eq!(page.data[0].id(), Some("r11"));
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.pagination.has_next);
    assert!(page.pagination.has_prev);
}

#[tokio::test]
async fn sort_by_quantity_ascending() {
    let store = open(InMemoryKeyValueStore::new(), seed());

    let page = store
        .list(ListOptions::new().sort_by("quantity").sort_order(SortOrder::Asc))
        .await
        .unwrap();
    assert_eq!(ids(&page.data), vec!["b", "c", "a"]);

    // Listing never reorders the stored collection.
    assert_eq!(ids(&store.records()), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn list_filters_before_paginating() {
    let store = open(InMemoryKeyValueStore::new(), seed());

    let page = store
        .list(
            ListOptions::new()
                .filter(|r| r.get("quantity").and_then(|q| q.as_i64()).is_some_and(|q| q >= 3))
                .sort_by("quantity")
                .sort_order(SortOrder::Desc)
                .page_size(1),
        )
        .await
        .unwrap();

    assert_eq!(ids(&page.data), vec!["a"]);
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.pagination.total_pages, 2);
}

#[tokio::test]
async fn zero_page_size_is_rejected() {
    let store = open(InMemoryKeyValueStore::new(), seed());
    let err = store.list(ListOptions::new().page_size(0)).await.unwrap_err();
    assert!(matches!(err, StoreError::State(_)));
}

#[tokio::test]
async fn bulk_delete_writes_once() {
    let kv = RecordingKv::new();
    let store = open(kv.clone(), seed());
    let writes = kv.writes();

    assert!(store.bulk_delete(&["a", "b", "x"]).await.unwrap());

    assert_eq!(kv.writes(), writes + 1);
    assert_eq!(ids(&store.records()), vec!["c"]);
    assert_eq!(ids(&kv.persisted("inventory")), vec!["c"]);
}

#[test]
fn corrupt_data_falls_back_to_seed() {
    let kv = RecordingKv::new();
    kv.set_raw("inventory", "not json{");

    let store = open(kv.clone(), seed());

    assert_eq!(*store.records(), seed());
    assert_eq!(kv.persisted("inventory"), seed());
}

#[tokio::test]
async fn repeated_ids_fall_back_to_seed() {
    let kv = RecordingKv::new();
    kv.set_raw("inventory", r#"[{"id":"a","q":1},{"id":"a","q":2}]"#);

    let store = open(kv.clone(), seed());
    assert_eq!(*store.records(), seed());

    store.update("a", Record::new().with("q", 9)).await.unwrap();
    let persisted = kv.persisted("inventory");
    assert_eq!(persisted.iter().filter(|r| r.id() == Some("a")).count(), 1);
    assert_eq!(persisted.len(), 3);
}

#[test]
fn non_array_data_falls_back_to_seed() {
    let kv = RecordingKv::new();
    kv.set_raw("inventory", r#"{"id":"a"}"#);
    let store = open(kv.clone(), seed());
    assert_eq!(store.len(), 3);
}

#[test]
fn unreadable_data_falls_back_to_seed() {
    let kv = FlakyKv::new();
    kv.fail_reads(true);
    let store = open(kv.clone(), seed());
    assert_eq!(store.len(), 3);

    kv.fail_reads(false);
    assert!(erp_store::KeyValueStore::get(kv.inner(), "inventory").unwrap().is_some());
}

#[test]
fn failing_to_persist_the_seed_fails_open() {
    let kv = FlakyKv::new();
    kv.fail_writes(true);
    let err = CollectionStore::open(kv, "inventory", seed(), StoreOptions::immediate())
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::Persistence(_)));
}

#[tokio::test]
async fn failed_persist_leaves_memory_unchanged() {
    let kv = FlakyKv::new();
    let store = open(kv.clone(), seed());
    kv.fail_writes(true);

    let err = store.create(Record::new().with("name", "x")).await.unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    let err = store.update("a", Record::new().with("quantity", 0)).await.unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    store.bulk_delete(&["a", "b"]).await.unwrap_err();

    assert_eq!(*store.records(), seed());
    let snapshot = store.snapshot();
    assert_eq!(snapshot.revision, 0);
    assert!(matches!(snapshot.last_error, Some(StoreError::Persistence(_))));

    kv.fail_writes(false);
    store.create(Record::new().with("name", "x")).await.unwrap();
    assert_eq!(store.len(), 4);
    assert!(store.snapshot().last_error.is_none());
}

#[tokio::test]
async fn quota_exceeded_is_a_persistence_error() {
    let kv = InMemoryKeyValueStore::with_quota(400);
    let store = open(kv, seed());

    let big = "x".repeat(1000);
    let err = store.create(Record::new().with("blob", big)).await.unwrap_err();
    match err {
        StoreError::Persistence(message) => assert!(message.contains("quota")),
        other => panic!("expected persistence error, got {other:?}"),
    }
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn concurrent_creates_are_serialized() {
    let kv = RecordingKv::new();
    let options = StoreOptions {
        latency: Latency::Jitter {
            base: Duration::from_millis(1),
            spread: Duration::from_millis(5),
        },
        ..StoreOptions::immediate()
    };
    let store = Arc::new(CollectionStore::open(kv.clone(), "sales", Vec::new(), options).unwrap());
    let writes = kv.writes();

    let mut tasks = tokio::task::JoinSet::new();
    for n in 0..20 {
        let store = store.clone();
        tasks.spawn(async move { store.create(Record::new().with("n", n)).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(kv.writes(), writes + 20);
    let persisted = kv.persisted("sales");
    assert_eq!(persisted.len(), 20);
    assert_eq!(persisted, *store.records());
    assert_eq!(store.snapshot().revision, 20);
    assert_eq!(store.snapshot().in_flight, 0);
}

#[tokio::test]
async fn reads_see_the_latest_snapshot() {
    let store = open(InMemoryKeyValueStore::new(), seed());
    let mut rx = store.subscribe();
    rx.borrow_and_update();

    store.update("a", Record::new().with("quantity", 50)).await.unwrap();

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.revision, 1);
    assert_eq!(snapshot.records[0].get("quantity"), Some(&json!(50)));
}

#[tokio::test(start_paused = true)]
async fn operations_wait_out_the_latency() {
    let options = StoreOptions {
        latency: Latency::Fixed(Duration::from_millis(300)),
        ..StoreOptions::default()
    };
    let store = CollectionStore::open(InMemoryKeyValueStore::new(), "hr", seed(), options).unwrap();

    let start = tokio::time::Instant::now();
    store.read("a").await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let kv = FileKeyValueStore::open(dir.path()).unwrap();
        let store = open(kv, seed());
        store.remove("a").await.unwrap();
        store.create(item("d", 9)).await.unwrap();
    }

    let kv = FileKeyValueStore::open(dir.path()).unwrap();
    let store = open(kv, Vec::new());
    assert_eq!(ids(&store.records()), vec!["b", "c", "d"]);
}

#[tokio::test]
async fn registry_shares_one_store_per_key() {
    let kv = RecordingKv::new();
    let collections = Collections::new(kv.clone(), StoreOptions::immediate());

    let first = collections.open("inventory", seed).unwrap();
    first.remove("a").await.unwrap();

    let second = collections.open("inventory", Vec::new).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ids(&second.records()), vec!["b", "c"]);
    assert_eq!(kv.raw("inventory").map(|raw| raw.contains("\"a\"")), Some(false));
}
