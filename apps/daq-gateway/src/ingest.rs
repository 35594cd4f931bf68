//! 采集链路装配模块
//!
//! 把 MQTT 采集源接到分发器上，并启动后台重试循环。
//! 两个任务都由同一个 shutdown 信号停止，主流程等待它们退出而不是中止。

use daq_config::GatewayConfig;
use daq_ingest::{IngestError, MqttSource, MqttSourceConfig, RawMessageHandler, Source};
use daq_pipeline::{DispatchOutcome, Dispatcher, RetryConfig, RetryLoop, StoreWriter};
use daq_storage::DurableQueue;
use domain::RawMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 分发处理器
///
/// 实现 `RawMessageHandler`，逐条调用分发器；分发结果只用于日志，不向总线返回错误。
struct DispatchHandler {
    dispatcher: Arc<Dispatcher>,
}

#[async_trait::async_trait]
impl RawMessageHandler for DispatchHandler {
    async fn handle(&self, message: RawMessage) -> Result<(), IngestError> {
        let outcome = self
            .dispatcher
            .dispatch(&message.topic, &message.payload)
            .await;
        match outcome {
            DispatchOutcome::Dropped(reason) => debug!(
                target: "daq.ingest",
                topic = %message.topic,
                reason = reason.as_str(),
                "message_dropped"
            ),
            outcome => debug!(
                target: "daq.ingest",
                topic = %message.topic,
                payload_size = message.payload.len(),
                received_at_ms = message.received_at_ms,
                outcome = ?outcome,
                "message_dispatched"
            ),
        }
        Ok(())
    }
}

/// 启动 MQTT 采集任务。
pub fn spawn_ingest(
    config: &GatewayConfig,
    dispatcher: Arc<Dispatcher>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let mqtt_config = MqttSourceConfig {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
        client_id: config.mqtt_client_id.clone(),
        topic_prefix: config.topic_prefix.clone(),
    };
    info!(
        target: "daq.ingest",
        host = %mqtt_config.host,
        port = mqtt_config.port,
        prefix = %mqtt_config.topic_prefix,
        "ingest_source_mqtt"
    );
    spawn_source(Arc::new(MqttSource::new(mqtt_config)), dispatcher, shutdown)
}

/// 把任意采集源接到分发器上；进行中的分发完成后任务才会退出。
pub fn spawn_source(
    source: Arc<dyn Source>,
    dispatcher: Arc<Dispatcher>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let handler: Arc<dyn RawMessageHandler> = Arc::new(DispatchHandler { dispatcher });
    tokio::spawn(async move {
        if let Err(err) = source.run(handler, shutdown).await {
            warn!(target: "daq.ingest", error = %err, "ingest_stopped");
        }
    })
}

pub fn retry_config(config: &GatewayConfig) -> RetryConfig {
    RetryConfig {
        idle_interval: Duration::from_millis(config.retry_idle_ms),
        base_delay: Duration::from_millis(config.retry_base_ms),
        max_delay: Duration::from_millis(config.retry_max_ms),
    }
}

/// 启动后台重试循环，shutdown 置 true 后退出。
pub fn spawn_retry(
    config: &GatewayConfig,
    spool: Arc<dyn DurableQueue>,
    writer: Arc<StoreWriter>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let retry = RetryLoop::new(spool, writer, retry_config(config));
    tokio::spawn(retry.run(shutdown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_ingest::ChannelSource;
    use daq_storage::{
        InMemoryDeviceRegistry, InMemorySpool, InMemoryTimeSeriesStore, StorageError,
        TimeSeriesStore,
    };
    use domain::{DeviceInfo, TimePrecision, TimeSeriesPoint};

    /// 写入耗时且最终失败的时序库。
    struct SlowFailingStore;

    #[async_trait::async_trait]
    impl TimeSeriesStore for SlowFailingStore {
        async fn write_points(
            &self,
            _points: &[TimeSeriesPoint],
            _database: &str,
            _precision: TimePrecision,
        ) -> Result<(), StorageError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Err(StorageError::new("influx unavailable"))
        }
    }

    #[tokio::test]
    async fn handler_dispatches_messages() {
        let registry = Arc::new(InMemoryDeviceRegistry::new());
        registry.register(DeviceInfo::new("dev-1")).expect("register");
        let store = Arc::new(InMemoryTimeSeriesStore::new());
        let writer = Arc::new(StoreWriter::new(store.clone(), Duration::from_secs(1)));
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            writer,
            Arc::new(InMemorySpool::new()),
        ));
        let handler = DispatchHandler { dispatcher };

        handler
            .handle(RawMessage {
                topic: "dt/pqopen/dev-1/event/json".to_string(),
                payload: br#"{"timestamp":1700000000.25,"event_type":"overvoltage","channel":"u1","data":{"value":250.2}}"#.to_vec(),
                received_at_ms: 0,
            })
            .await
            .expect("handle");
        handler
            .handle(RawMessage {
                topic: "bad/topic".to_string(),
                payload: Vec::new(),
                received_at_ms: 0,
            })
            .await
            .expect("handle");

        let points = store.points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].measurement, "events");
        assert_eq!(points[0].timestamp, 1_700_000_000_250_000);
    }

    #[test]
    fn retry_config_comes_from_gateway_config() {
        let config = GatewayConfig::from_lookup(|key| match key {
            "DAQOPEN_RETRY_BASE_MS" => Some("250".to_string()),
            _ => None,
        })
        .expect("config");
        let retry = retry_config(&config);
        assert_eq!(retry.base_delay, Duration::from_millis(250));
        assert_eq!(retry.max_delay, Duration::from_secs(60));
        assert_eq!(retry.idle_interval, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn shutdown_during_failing_write_still_spools() {
        let registry = Arc::new(InMemoryDeviceRegistry::new());
        registry.register(DeviceInfo::new("dev-1")).expect("register");
        let writer = Arc::new(StoreWriter::new(
            Arc::new(SlowFailingStore),
            Duration::from_secs(1),
        ));
        let spool = Arc::new(InMemorySpool::new());
        let dispatcher = Arc::new(Dispatcher::new(registry, writer, spool.clone()));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (sender, source) = ChannelSource::channel(8);
        let task = spawn_source(Arc::new(source), dispatcher, shutdown_rx);

        sender
            .send(RawMessage {
                topic: "dt/pqopen/dev-1/event/json".to_string(),
                payload: br#"{"timestamp":1700000000.25,"event_type":"overvoltage","channel":"u1","data":{"value":250.2}}"#.to_vec(),
                received_at_ms: 0,
            })
            .await
            .expect("send");
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).expect("shutdown");

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("ingest stops")
            .expect("join");
        assert_eq!(spool.len().await.expect("len"), 1);
    }
}
