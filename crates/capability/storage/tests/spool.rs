use daq_storage::{
    DurableQueue, NewSpoolEntry, OverflowPolicy, SpoolCapacity, SpoolError, SqliteSpool,
};

fn entry(device: &str, payload: &str) -> NewSpoolEntry {
    NewSpoolEntry {
        data_type: "aggregated".to_string(),
        device: device.to_string(),
        payload: payload.to_string(),
        enqueued_at_ms: 1_700_000_000_000,
    }
}

fn spool_path(dir: &tempfile::TempDir) -> String {
    dir.path().join("spool.sq3").to_string_lossy().into_owned()
}

#[tokio::test]
async fn empty_spool_creates_table_lazily() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spool = SqliteSpool::connect(&spool_path(&dir), SpoolCapacity::default())
        .await
        .expect("connect");
    assert_eq!(spool.len().await.expect("len"), 0);
    assert!(spool.peek_oldest().await.expect("peek").is_none());
}

#[tokio::test]
async fn entries_are_read_in_fifo_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spool = SqliteSpool::connect(&spool_path(&dir), SpoolCapacity::default())
        .await
        .expect("connect");

    let first = spool.enqueue(entry("{}", "{\"a\":1}")).await.expect("first");
    let second = spool.enqueue(entry("{}", "{\"a\":2}")).await.expect("second");
    assert!(second.id > first.id);
    assert_eq!(spool.len().await.expect("len"), 2);

    let oldest = spool.peek_oldest().await.expect("peek").expect("entry");
    assert_eq!(oldest.id, first.id);
    assert_eq!(oldest.payload, "{\"a\":1}");

    spool.delete(oldest.id).await.expect("delete");
    let next = spool.peek_oldest().await.expect("peek").expect("entry");
    assert_eq!(next.id, second.id);
}

#[tokio::test]
async fn ids_are_not_reused_after_delete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spool = SqliteSpool::connect(&spool_path(&dir), SpoolCapacity::default())
        .await
        .expect("connect");

    let first = spool.enqueue(entry("{}", "{}")).await.expect("first");
    spool.delete(first.id).await.expect("delete");
    let second = spool.enqueue(entry("{}", "{}")).await.expect("second");
    assert!(second.id > first.id);
}

#[tokio::test]
async fn delete_of_missing_id_is_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spool = SqliteSpool::connect(&spool_path(&dir), SpoolCapacity::default())
        .await
        .expect("connect");
    spool.enqueue(entry("{}", "{}")).await.expect("enqueue");
    spool.delete(9_999).await.expect("delete missing");
    assert_eq!(spool.len().await.expect("len"), 1);
}

#[tokio::test]
async fn entries_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = spool_path(&dir);
    let id = {
        let spool = SqliteSpool::connect(&path, SpoolCapacity::default())
            .await
            .expect("connect");
        spool
            .enqueue(entry("{\"location\":\"lab\"}", "{\"x\":1}"))
            .await
            .expect("enqueue")
            .id
    };

    let reopened = SqliteSpool::connect(&path, SpoolCapacity::default())
        .await
        .expect("reopen");
    let oldest = reopened.peek_oldest().await.expect("peek").expect("entry");
    assert_eq!(oldest.id, id);
    assert_eq!(oldest.device, "{\"location\":\"lab\"}");
}

#[tokio::test]
async fn full_spool_rejects_newest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let capacity = SpoolCapacity {
        max_entries: 2,
        overflow: OverflowPolicy::RejectNewest,
    };
    let spool = SqliteSpool::connect(&spool_path(&dir), capacity)
        .await
        .expect("connect");
    spool.enqueue(entry("{}", "1")).await.expect("1");
    spool.enqueue(entry("{}", "2")).await.expect("2");

    let err = spool.enqueue(entry("{}", "3")).await.expect_err("full");
    assert!(matches!(err, SpoolError::Full(2)));
    assert_eq!(spool.len().await.expect("len"), 2);
    let oldest = spool.peek_oldest().await.expect("peek").expect("entry");
    assert_eq!(oldest.payload, "1");
}

#[tokio::test]
async fn full_spool_evicts_oldest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let capacity = SpoolCapacity {
        max_entries: 2,
        overflow: OverflowPolicy::EvictOldest,
    };
    let spool = SqliteSpool::connect(&spool_path(&dir), capacity)
        .await
        .expect("connect");
    spool.enqueue(entry("{}", "1")).await.expect("1");
    spool.enqueue(entry("{}", "2")).await.expect("2");

    let receipt = spool.enqueue(entry("{}", "3")).await.expect("3");
    assert_eq!(receipt.evicted, 1);
    assert_eq!(spool.len().await.expect("len"), 2);
    let oldest = spool.peek_oldest().await.expect("peek").expect("entry");
    assert_eq!(oldest.payload, "2");
}

#[tokio::test]
async fn zero_capacity_is_treated_as_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let capacity = SpoolCapacity {
        max_entries: 0,
        overflow: OverflowPolicy::RejectNewest,
    };
    let spool = SqliteSpool::connect(&spool_path(&dir), capacity)
        .await
        .expect("connect");
    assert_eq!(spool.capacity().max_entries, 1);
    spool.enqueue(entry("{}", "1")).await.expect("1");
    assert!(spool.enqueue(entry("{}", "2")).await.is_err());
}
