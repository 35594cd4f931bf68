//! 时序库内存实现
//!
//! 记录每次成功写入的批次；`set_available(false)` 模拟时序库不可用。

use crate::error::StorageError;
use crate::traits::TimeSeriesStore;
use domain::{TimePrecision, TimeSeriesPoint};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 一次已确认的写入。
#[derive(Debug, Clone)]
pub struct WrittenBatch {
    pub database: String,
    pub precision: TimePrecision,
    pub points: Vec<TimeSeriesPoint>,
}

pub struct InMemoryTimeSeriesStore {
    available: AtomicBool,
    attempts: AtomicU64,
    batches: Mutex<Vec<WrittenBatch>>,
}

impl InMemoryTimeSeriesStore {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            attempts: AtomicU64::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 写入尝试次数（含失败）
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<WrittenBatch> {
        self.batches
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    pub fn points(&self) -> Vec<TimeSeriesPoint> {
        self.batches()
            .into_iter()
            .flat_map(|batch| batch.points)
            .collect()
    }
}

impl Default for InMemoryTimeSeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TimeSeriesStore for InMemoryTimeSeriesStore {
    async fn write_points(
        &self,
        points: &[TimeSeriesPoint],
        database: &str,
        precision: TimePrecision,
    ) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(StorageError::new("time-series store unavailable"));
        }
        let mut batches = self
            .batches
            .lock()
            .map_err(|_| StorageError::new("lock failed"))?;
        batches.push(WrittenBatch {
            database: database.to_string(),
            precision,
            points: points.to_vec(),
        });
        Ok(())
    }
}
