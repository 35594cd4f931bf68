//! 追踪初始化与进程级计数器。

use serde::Serialize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 指标快照，供运维接口序列化输出。
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub points_written: u64,
    pub write_success: u64,
    pub write_failure: u64,
    pub write_latency_ms_total: u64,
    pub write_latency_ms_count: u64,
    pub spooled: u64,
    pub spool_rejected: u64,
    pub spool_evicted: u64,
    pub retry_success: u64,
    pub retry_failure: u64,
    pub retry_discarded: u64,
    pub dropped_invalid_topic: u64,
    pub dropped_unknown_data_type: u64,
    pub dropped_unknown_device: u64,
    pub dropped_decode: u64,
    pub dropped_empty: u64,
    pub registry_failure: u64,
    pub spool_failure: u64,
}

/// 网关计数器。
pub struct TelemetryMetrics {
    messages_received: AtomicU64,
    points_written: AtomicU64,
    write_success: AtomicU64,
    write_failure: AtomicU64,
    write_latency_ms_total: AtomicU64,
    write_latency_ms_count: AtomicU64,
    spooled: AtomicU64,
    spool_rejected: AtomicU64,
    spool_evicted: AtomicU64,
    retry_success: AtomicU64,
    retry_failure: AtomicU64,
    retry_discarded: AtomicU64,
    dropped_invalid_topic: AtomicU64,
    dropped_unknown_data_type: AtomicU64,
    dropped_unknown_device: AtomicU64,
    dropped_decode: AtomicU64,
    dropped_empty: AtomicU64,
    registry_failure: AtomicU64,
    spool_failure: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            points_written: AtomicU64::new(0),
            write_success: AtomicU64::new(0),
            write_failure: AtomicU64::new(0),
            write_latency_ms_total: AtomicU64::new(0),
            write_latency_ms_count: AtomicU64::new(0),
            spooled: AtomicU64::new(0),
            spool_rejected: AtomicU64::new(0),
            spool_evicted: AtomicU64::new(0),
            retry_success: AtomicU64::new(0),
            retry_failure: AtomicU64::new(0),
            retry_discarded: AtomicU64::new(0),
            dropped_invalid_topic: AtomicU64::new(0),
            dropped_unknown_data_type: AtomicU64::new(0),
            dropped_unknown_device: AtomicU64::new(0),
            dropped_decode: AtomicU64::new(0),
            dropped_empty: AtomicU64::new(0),
            registry_failure: AtomicU64::new(0),
            spool_failure: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            points_written: self.points_written.load(Ordering::Relaxed),
            write_success: self.write_success.load(Ordering::Relaxed),
            write_failure: self.write_failure.load(Ordering::Relaxed),
            write_latency_ms_total: self.write_latency_ms_total.load(Ordering::Relaxed),
            write_latency_ms_count: self.write_latency_ms_count.load(Ordering::Relaxed),
            spooled: self.spooled.load(Ordering::Relaxed),
            spool_rejected: self.spool_rejected.load(Ordering::Relaxed),
            spool_evicted: self.spool_evicted.load(Ordering::Relaxed),
            retry_success: self.retry_success.load(Ordering::Relaxed),
            retry_failure: self.retry_failure.load(Ordering::Relaxed),
            retry_discarded: self.retry_discarded.load(Ordering::Relaxed),
            dropped_invalid_topic: self.dropped_invalid_topic.load(Ordering::Relaxed),
            dropped_unknown_data_type: self.dropped_unknown_data_type.load(Ordering::Relaxed),
            dropped_unknown_device: self.dropped_unknown_device.load(Ordering::Relaxed),
            dropped_decode: self.dropped_decode.load(Ordering::Relaxed),
            dropped_empty: self.dropped_empty.load(Ordering::Relaxed),
            registry_failure: self.registry_failure.load(Ordering::Relaxed),
            spool_failure: self.spool_failure.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info，可由 RUST_LOG 覆盖）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 记录收到的消息数。
pub fn record_message_received() {
    metrics().messages_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录一次确认写入（含重试写入）及点数。
pub fn record_write_success(points: u64) {
    let metrics = metrics();
    metrics.write_success.fetch_add(1, Ordering::Relaxed);
    metrics.points_written.fetch_add(points, Ordering::Relaxed);
}

/// 记录写入失败次数（含超时）。
pub fn record_write_failure() {
    metrics().write_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入延迟（毫秒）。
pub fn record_write_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .write_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .write_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录入队次数。
pub fn record_spooled() {
    metrics().spooled.fetch_add(1, Ordering::Relaxed);
}

/// 记录队列满被拒绝的记录数。
pub fn record_spool_rejected() {
    metrics().spool_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录因容量被淘汰的最旧条目数。
pub fn record_spool_evicted(count: u64) {
    metrics().spool_evicted.fetch_add(count, Ordering::Relaxed);
}

pub fn record_retry_success() {
    metrics().retry_success.fetch_add(1, Ordering::Relaxed);
}

pub fn record_retry_failure() {
    metrics().retry_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录无法解析而丢弃的队列条目。
pub fn record_retry_discarded() {
    metrics().retry_discarded.fetch_add(1, Ordering::Relaxed);
}

pub fn record_dropped_invalid_topic() {
    metrics()
        .dropped_invalid_topic
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_dropped_unknown_data_type() {
    metrics()
        .dropped_unknown_data_type
        .fetch_add(1, Ordering::Relaxed);
}

pub fn record_dropped_unknown_device() {
    metrics()
        .dropped_unknown_device
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录解码失败（未知编码、gzip、JSON、结构不符）。
pub fn record_dropped_decode() {
    metrics().dropped_decode.fetch_add(1, Ordering::Relaxed);
}

/// 记录转换后无点可写的消息。
pub fn record_dropped_empty() {
    metrics().dropped_empty.fetch_add(1, Ordering::Relaxed);
}

pub fn record_registry_failure() {
    metrics().registry_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录队列自身读写失败。
pub fn record_spool_failure() {
    metrics().spool_failure.fetch_add(1, Ordering::Relaxed);
}
