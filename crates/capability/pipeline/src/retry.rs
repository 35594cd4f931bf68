//! 后台重试循环。
//!
//! 每次迭代读取最旧条目并重放：成功则删除并立即继续；失败按指数退避等待。
//! 队列为空时按空闲间隔轮询。停机信号只在迭代之间和等待期间检查，
//! 进行中的写入总会完成。

use crate::record::SpooledRecord;
use crate::writer::StoreWriter;
use daq_storage::DurableQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// 所有等待间隔的下限；零间隔会让循环空转。
pub const MIN_DELAY: Duration = Duration::from_millis(1);

/// 重试参数。
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// 队列为空时的轮询间隔。
    pub idle_interval: Duration,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_secs(1),
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// 间隔不低于 MIN_DELAY，且 max_delay 不小于 base_delay。
    pub fn sanitized(mut self) -> Self {
        self.idle_interval = self.idle_interval.max(MIN_DELAY);
        self.base_delay = self.base_delay.max(MIN_DELAY);
        self.max_delay = self.max_delay.max(self.base_delay);
        self
    }
}

/// 带上限的指数退避：base, 2·base, 4·base, ... 直到 max。
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(MIN_DELAY);
        let max = max.max(base);
        Self {
            base,
            max,
            next: base,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self
            .next
            .checked_mul(2)
            .unwrap_or(self.max)
            .min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.next = self.base;
    }
}

/// 单次迭代的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// 队列为空。
    Idle,
    /// 重放成功并已删除。
    Delivered(i64),
    /// 写入失败，条目保留在队首。
    Failed(i64),
    /// 条目无法解析或不产生时序点，已删除。
    Discarded(i64),
    /// 队列自身读写失败。
    SpoolError,
}

pub struct RetryLoop {
    spool: Arc<dyn DurableQueue>,
    writer: Arc<StoreWriter>,
    config: RetryConfig,
}

impl RetryLoop {
    pub fn new(spool: Arc<dyn DurableQueue>, writer: Arc<StoreWriter>, config: RetryConfig) -> Self {
        Self {
            spool,
            writer,
            config: config.sanitized(),
        }
    }

    /// 执行一次迭代（不等待）。
    pub async fn step(&self) -> RetryStep {
        let entry = match self.spool.peek_oldest().await {
            Ok(Some(entry)) => entry,
            Ok(None) => return RetryStep::Idle,
            Err(err) => {
                daq_telemetry::record_spool_failure();
                error!(target: "daq.retry", error = %err, "spool_read_failed");
                return RetryStep::SpoolError;
            }
        };

        let record = match SpooledRecord::from_entry(&entry) {
            Ok(record) => record,
            Err(err) => {
                error!(target: "daq.retry", entry_id = entry.id, error = %err, "spool_entry_unreadable");
                return self.discard(entry.id).await;
            }
        };
        let batch = record.points();
        if batch.is_empty() {
            error!(target: "daq.retry", entry_id = entry.id, "spool_entry_without_points");
            return self.discard(entry.id).await;
        }

        if !self
            .writer
            .write(&batch.points, &record.device.target_database, batch.precision)
            .await
        {
            daq_telemetry::record_retry_failure();
            warn!(target: "daq.retry", entry_id = entry.id, "retry_write_failed");
            return RetryStep::Failed(entry.id);
        }

        match self.spool.delete(entry.id).await {
            Ok(()) => {
                daq_telemetry::record_retry_success();
                info!(
                    target: "daq.retry",
                    entry_id = entry.id,
                    points = batch.len(),
                    "spool_entry_delivered"
                );
                RetryStep::Delivered(entry.id)
            }
            Err(err) => {
                // 已写入但未删除：下次会重放同一条目，依赖时序库覆盖写
                daq_telemetry::record_spool_failure();
                error!(target: "daq.retry", entry_id = entry.id, error = %err, "spool_delete_failed");
                RetryStep::SpoolError
            }
        }
    }

    async fn discard(&self, id: i64) -> RetryStep {
        match self.spool.delete(id).await {
            Ok(()) => {
                daq_telemetry::record_retry_discarded();
                RetryStep::Discarded(id)
            }
            Err(err) => {
                daq_telemetry::record_spool_failure();
                error!(target: "daq.retry", entry_id = id, error = %err, "spool_delete_failed");
                RetryStep::SpoolError
            }
        }
    }

    /// 持续重放，直到 shutdown 变为 true 或发送端关闭。
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = Backoff::new(self.config.base_delay, self.config.max_delay);
        info!(target: "daq.retry", "retry_loop_started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let delay = match self.step().await {
                RetryStep::Delivered(_) => {
                    backoff.reset();
                    continue;
                }
                RetryStep::Discarded(_) => continue,
                RetryStep::Idle => self.config.idle_interval,
                RetryStep::Failed(_) | RetryStep::SpoolError => backoff.next_delay(),
            };
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(target: "daq.retry", "retry_loop_stopped");
    }
}
