use daq_pipeline::{
    DispatchOutcome, Dispatcher, RetryConfig, RetryLoop, RetryStep, SpooledRecord, StoreWriter,
};
use daq_storage::{
    DurableQueue, EnqueueReceipt, InMemoryDeviceRegistry, InMemorySpool, InMemoryTimeSeriesStore,
    NewSpoolEntry, SpoolEntry, SpoolError, StorageError,
};
use domain::{DeviceInfo, FieldValue};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::watch;

fn fast_config() -> RetryConfig {
    RetryConfig {
        idle_interval: Duration::from_millis(5),
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

fn writer(store: &Arc<InMemoryTimeSeriesStore>) -> Arc<StoreWriter> {
    Arc::new(StoreWriter::new(store.clone(), Duration::from_secs(1)))
}

async fn spool_three(
    store: &Arc<InMemoryTimeSeriesStore>,
    spool: &Arc<InMemorySpool>,
) -> Vec<i64> {
    let registry = Arc::new(InMemoryDeviceRegistry::new());
    registry.register(DeviceInfo::new("dev-1")).expect("register");
    let dispatcher = Dispatcher::new(registry, writer(store), spool.clone());
    store.set_available(false);
    let mut ids = Vec::new();
    for value in [1.0, 2.0, 3.0] {
        let payload = format!(
            r#"{{"timestamp":1700000000,"interval_sec":1,"data":{{"u1":{}}}}}"#,
            value
        );
        match dispatcher
            .dispatch("dt/pqopen/dev-1/aggregated/json", payload.as_bytes())
            .await
        {
            DispatchOutcome::Spooled { entry_id } => ids.push(entry_id),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    ids
}

#[tokio::test]
async fn empty_spool_is_idle() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let retry = RetryLoop::new(Arc::new(InMemorySpool::new()), writer(&store), fast_config());
    assert_eq!(retry.step().await, RetryStep::Idle);
    assert_eq!(store.attempts(), 0);
}

#[tokio::test]
async fn failed_write_keeps_entry_at_head() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let spool = Arc::new(InMemorySpool::new());
    let ids = spool_three(&store, &spool).await;
    let retry = RetryLoop::new(spool.clone(), writer(&store), fast_config());

    assert_eq!(retry.step().await, RetryStep::Failed(ids[0]));
    assert_eq!(retry.step().await, RetryStep::Failed(ids[0]));
    assert_eq!(spool.len().await.expect("len"), 3);
}

#[tokio::test]
async fn recovery_drains_in_enqueue_order() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let spool = Arc::new(InMemorySpool::new());
    let ids = spool_three(&store, &spool).await;
    store.set_available(true);
    let retry = RetryLoop::new(spool.clone(), writer(&store), fast_config());

    for id in &ids {
        assert_eq!(retry.step().await, RetryStep::Delivered(*id));
    }
    assert_eq!(retry.step().await, RetryStep::Idle);
    assert_eq!(spool.len().await.expect("len"), 0);

    let values: Vec<Option<f64>> = store
        .points()
        .iter()
        .map(|point| point.fields.get("u1").and_then(FieldValue::as_f64))
        .collect();
    assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);

    // 重复删除为空操作
    spool.delete(ids[0]).await.expect("delete again");
}

#[tokio::test]
async fn unreadable_entry_is_discarded() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let spool = Arc::new(InMemorySpool::new());
    let poisoned = spool
        .enqueue(NewSpoolEntry {
            data_type: "aggregated".to_string(),
            device: "not json".to_string(),
            payload: "{}".to_string(),
            enqueued_at_ms: 0,
        })
        .await
        .expect("enqueue")
        .id;
    let record = SpooledRecord::from_entry(&SpoolEntry {
        id: 0,
        data_type: "aggregated".to_string(),
        device: serde_json::to_string(&DeviceInfo::new("dev-1")).expect("device"),
        payload: r#"{"timestamp":1,"interval_sec":1,"data":{"u1":1.0}}"#.to_string(),
        enqueued_at_ms: 0,
    })
    .expect("record");
    let good = spool
        .enqueue(record.to_entry(0).expect("entry"))
        .await
        .expect("enqueue")
        .id;

    let retry = RetryLoop::new(spool.clone(), writer(&store), fast_config());
    assert_eq!(retry.step().await, RetryStep::Discarded(poisoned));
    assert_eq!(retry.step().await, RetryStep::Delivered(good));
}

/// 前 N 次读取失败的队列。
struct FlakySpool {
    inner: InMemorySpool,
    failures: AtomicU32,
}

#[async_trait::async_trait]
impl DurableQueue for FlakySpool {
    async fn enqueue(&self, entry: NewSpoolEntry) -> Result<EnqueueReceipt, SpoolError> {
        self.inner.enqueue(entry).await
    }

    async fn peek_oldest(&self) -> Result<Option<SpoolEntry>, StorageError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::new("disk unavailable"));
        }
        self.inner.peek_oldest().await
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        self.inner.delete(id).await
    }

    async fn len(&self) -> Result<u64, StorageError> {
        self.inner.len().await
    }
}

#[tokio::test]
async fn spool_errors_do_not_stop_the_loop() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let spool = Arc::new(FlakySpool {
        inner: InMemorySpool::new(),
        failures: AtomicU32::new(2),
    });
    let record = SpooledRecord::from_entry(&SpoolEntry {
        id: 0,
        data_type: "aggregated".to_string(),
        device: serde_json::to_string(&DeviceInfo::new("dev-1")).expect("device"),
        payload: r#"{"timestamp":1,"interval_sec":1,"data":{"u1":1.0}}"#.to_string(),
        enqueued_at_ms: 0,
    })
    .expect("record");
    spool
        .enqueue(record.to_entry(0).expect("entry"))
        .await
        .expect("enqueue");

    let retry = RetryLoop::new(spool.clone(), writer(&store), fast_config());
    assert_eq!(retry.step().await, RetryStep::SpoolError);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(retry.run(shutdown_rx));
    wait_until_empty(spool.as_ref()).await;
    shutdown_tx.send(true).expect("shutdown");
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop stops")
        .expect("join");
    assert_eq!(store.points().len(), 1);
}

#[tokio::test]
async fn run_drains_after_recovery_and_stops_on_shutdown() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let spool = Arc::new(InMemorySpool::new());
    spool_three(&store, &spool).await;

    let retry = RetryLoop::new(spool.clone(), writer(&store), fast_config());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(retry.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(spool.len().await.expect("len"), 3);
    store.set_available(true);
    wait_until_empty(spool.as_ref()).await;

    shutdown_tx.send(true).expect("shutdown");
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop stops")
        .expect("join");
    assert_eq!(store.batches().len(), 3);
}

async fn wait_until_empty(spool: &dyn DurableQueue) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while spool.len().await.expect("len") > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("spool drained");
}
