//! 存储接口 Trait 定义
//!
//! - DeviceRegistry：设备元数据查询（只读）
//! - DurableQueue：写入失败记录的持久化队列
//! - TimeSeriesStore：时序库写入
//!
//! 设计原则：
//! - 所有接口返回 StorageError（队列入队返回 SpoolError）
//! - 使用 async_trait 支持动态分发

use crate::error::{SpoolError, StorageError};
use crate::models::{EnqueueReceipt, NewSpoolEntry, SpoolEntry};
use async_trait::async_trait;
use domain::{DeviceInfo, TimePrecision, TimeSeriesPoint};

/// 设备注册表接口
///
/// 不做进程内缓存，每次查询都读取后端，保证拿到最新记录。
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// 按设备 ID 查询，不存在时返回 None
    async fn lookup(&self, device_id: &str) -> Result<Option<DeviceInfo>, StorageError>;
}

/// 持久化队列接口
///
/// 条目按 id 升序（FIFO）读取；实现内部保证入队/读取/删除互斥。
#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// 追加条目并分配下一个 id
    async fn enqueue(&self, entry: NewSpoolEntry) -> Result<EnqueueReceipt, SpoolError>;

    /// 读取 id 最小的条目，不出队
    async fn peek_oldest(&self) -> Result<Option<SpoolEntry>, StorageError>;

    /// 删除条目；id 不存在时为空操作
    async fn delete(&self, id: i64) -> Result<(), StorageError>;

    /// 当前条目数
    async fn len(&self) -> Result<u64, StorageError>;
}

/// 时序库写入接口
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// 一次写入整批点，成功表示时序库已确认
    async fn write_points(
        &self,
        points: &[TimeSeriesPoint],
        database: &str,
        precision: TimePrecision,
    ) -> Result<(), StorageError>;
}
