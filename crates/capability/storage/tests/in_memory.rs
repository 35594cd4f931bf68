use daq_storage::{
    DeviceRegistry, DurableQueue, InMemoryDeviceRegistry, InMemorySpool,
    InMemoryTimeSeriesStore, NewSpoolEntry, OverflowPolicy, SpoolCapacity, TimeSeriesStore,
};
use domain::{DeviceInfo, FieldValue, TimePrecision, TimeSeriesPoint};
use std::collections::BTreeMap;

fn entry(payload: &str) -> NewSpoolEntry {
    NewSpoolEntry {
        data_type: "event".to_string(),
        device: "{}".to_string(),
        payload: payload.to_string(),
        enqueued_at_ms: 0,
    }
}

#[tokio::test]
async fn registry_register_and_remove() {
    let registry = InMemoryDeviceRegistry::new();
    registry.register(DeviceInfo::new("dev-1")).expect("register");
    assert!(registry.lookup("dev-1").await.expect("lookup").is_some());
    registry.remove("dev-1").expect("remove");
    assert!(registry.lookup("dev-1").await.expect("lookup").is_none());
}

#[tokio::test]
async fn spool_fifo_and_eviction() {
    let spool = InMemorySpool::with_capacity(SpoolCapacity {
        max_entries: 2,
        overflow: OverflowPolicy::EvictOldest,
    });
    let first = spool.enqueue(entry("1")).await.expect("1");
    assert_eq!(first.id, 1);
    spool.enqueue(entry("2")).await.expect("2");
    let third = spool.enqueue(entry("3")).await.expect("3");
    assert_eq!(third.evicted, 1);

    let payloads: Vec<String> = spool.entries().into_iter().map(|e| e.payload).collect();
    assert_eq!(payloads, vec!["2".to_string(), "3".to_string()]);
    assert_eq!(spool.peek_oldest().await.expect("peek").expect("entry").id, 2);
}

#[tokio::test]
async fn timeseries_store_can_be_unavailable() {
    let store = InMemoryTimeSeriesStore::new();
    let mut fields = BTreeMap::new();
    fields.insert("u1".to_string(), FieldValue::Float(1.0));
    let point = TimeSeriesPoint {
        measurement: "agg_data".to_string(),
        tags: BTreeMap::new(),
        fields,
        timestamp: 1,
        precision: TimePrecision::Second,
    };

    store.set_available(false);
    assert!(
        store
            .write_points(std::slice::from_ref(&point), "daqopen", TimePrecision::Second)
            .await
            .is_err()
    );
    store.set_available(true);
    store
        .write_points(&[point], "daqopen", TimePrecision::Second)
        .await
        .expect("write");

    assert_eq!(store.attempts(), 2);
    let batches = store.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].database, "daqopen");
}
