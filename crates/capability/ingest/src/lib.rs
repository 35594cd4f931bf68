//! 消息总线接入。
//!
//! 订阅 `{prefix}/#`，把每条发布消息原样交给 `RawMessageHandler`。
//! 会话持久（clean_session = false，QoS 2），断线后由 broker 补发离线期间的消息。
//!
//! 停机信号只在两条消息之间生效：已收到的消息总会交给处理器并等它返回。

use async_trait::async_trait;
use domain::RawMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

/// RawMessage 处理器。
#[async_trait]
pub trait RawMessageHandler: Send + Sync {
    async fn handle(&self, message: RawMessage) -> Result<(), IngestError>;
}

/// 采集源抽象。
///
/// `run` 在 shutdown 变为 true（或发送端关闭）后返回，且不会打断正在执行的 `handle`。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(
        &self,
        handler: Arc<dyn RawMessageHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), IngestError>;
}

/// 占位源（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(
        &self,
        _handler: Arc<dyn RawMessageHandler>,
        _shutdown: watch::Receiver<bool>,
    ) -> Result<(), IngestError> {
        Ok(())
    }
}

/// 进程内通道源：从 mpsc 接收端读取消息，发送端全部关闭后返回。
pub struct ChannelSource {
    receiver: Mutex<mpsc::Receiver<RawMessage>>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<RawMessage>) -> Self {
        Self {
            receiver: Mutex::new(receiver),
        }
    }

    /// 创建一对发送端与通道源。
    pub fn channel(capacity: usize) -> (mpsc::Sender<RawMessage>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl Source for ChannelSource {
    async fn run(
        &self,
        handler: Arc<dyn RawMessageHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), IngestError> {
        let mut receiver = self.receiver.lock().await;
        loop {
            if *shutdown.borrow() {
                break;
            }
            let message = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                message = receiver.recv() => message,
            };
            let Some(message) = message else {
                break;
            };
            if let Err(err) = handler.handle(message).await {
                warn!(target: "daq.ingest", error = %err, "raw_message_handler_failed");
            }
        }
        info!(target: "daq.ingest", "channel_source_stopped");
        Ok(())
    }
}

/// MQTT 采集源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 固定客户端 ID，持久会话依赖它在重连间保持不变。
    pub client_id: String,
    pub topic_prefix: String,
}

/// MQTT 采集源。
#[derive(Debug, Clone)]
pub struct MqttSource {
    config: MqttSourceConfig,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }

    fn options(&self) -> rumqttc::MqttOptions {
        let mut options = rumqttc::MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(false);
        if let (Some(username), Some(password)) =
            (self.config.username.as_ref(), self.config.password.as_ref())
        {
            options.set_credentials(username, password);
        }
        options
    }
}

#[async_trait]
impl Source for MqttSource {
    async fn run(
        &self,
        handler: Arc<dyn RawMessageHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), IngestError> {
        let (client, mut eventloop) = rumqttc::AsyncClient::new(self.options(), 64);
        let filter = topic_filter(&self.config.topic_prefix);

        loop {
            if *shutdown.borrow() {
                break;
            }
            let event = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                event = eventloop.poll() => event,
            };
            match event {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(ack))) => {
                    // 每次（重新）连接都订阅一次，持久会话下 broker 会合并
                    info!(
                        target: "daq.ingest",
                        session_present = ack.session_present,
                        filter = %filter,
                        "mqtt_connected"
                    );
                    client
                        .subscribe(filter.clone(), rumqttc::QoS::ExactlyOnce)
                        .await
                        .map_err(|err| IngestError::Source(err.to_string()))?;
                }
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::Publish(publish))) => {
                    let message = RawMessage {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                        received_at_ms: now_epoch_ms(),
                    };
                    if let Err(err) = handler.handle(message).await {
                        warn!(target: "daq.ingest", error = %err, "raw_message_handler_failed");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(target: "daq.ingest", error = %err, "mqtt_connection_error");
                    tokio::select! {
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }
        }
        // 未确认的 QoS 2 消息留在持久会话中，下次连接由 broker 补发
        info!(target: "daq.ingest", "mqtt_source_stopped");
        Ok(())
    }
}

/// 订阅过滤器：`{prefix}/#`。
pub fn topic_filter(prefix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        "#".to_string()
    } else {
        format!("{}/#", prefix)
    }
}

pub fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
