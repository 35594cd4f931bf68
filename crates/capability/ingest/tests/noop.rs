use daq_ingest::{ChannelSource, IngestError, NoopSource, RawMessageHandler, Source};
use domain::RawMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Default)]
struct CountingHandler {
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait::async_trait]
impl RawMessageHandler for CountingHandler {
    async fn handle(&self, _message: RawMessage) -> Result<(), IngestError> {
        tokio::time::sleep(self.delay).await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn message(topic: &str) -> RawMessage {
    RawMessage {
        topic: topic.to_string(),
        payload: b"{}".to_vec(),
        received_at_ms: 0,
    }
}

#[tokio::test]
async fn noop_source_returns_without_messages() {
    let handler = Arc::new(CountingHandler::default());
    let (_tx, rx) = watch::channel(false);
    NoopSource.run(handler.clone(), rx).await.expect("run");
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn channel_source_drains_until_senders_close() {
    let handler = Arc::new(CountingHandler::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sender, source) = ChannelSource::channel(8);
    sender.send(message("dt/pqopen/dev-1/event/json")).await.expect("send");
    sender.send(message("dt/pqopen/dev-2/event/json")).await.expect("send");
    drop(sender);

    source.run(handler.clone(), shutdown_rx).await.expect("run");
    assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn shutdown_waits_for_message_in_flight() {
    let handler = Arc::new(CountingHandler {
        calls: AtomicUsize::new(0),
        delay: Duration::from_millis(200),
    });
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (sender, source) = ChannelSource::channel(8);
    let task = tokio::spawn({
        let handler = handler.clone();
        async move { source.run(handler, shutdown_rx).await }
    });

    sender.send(message("dt/pqopen/dev-1/event/json")).await.expect("send");
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true).expect("shutdown");

    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("source stops")
        .expect("join")
        .expect("run");
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

    // 停机后不再读取新消息
    assert!(sender.send(message("dt/pqopen/dev-1/event/json")).await.is_err());
}
