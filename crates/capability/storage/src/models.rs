//! 数据模型
//!
//! - 队列条目：NewSpoolEntry（待写入）、SpoolEntry（已持久化）、EnqueueReceipt
//! - 队列容量：SpoolCapacity、OverflowPolicy

/// 待入队的条目（设备快照与载荷均已序列化为 JSON）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpoolEntry {
    pub data_type: String,
    pub device: String,
    pub payload: String,
    pub enqueued_at_ms: i64,
}

/// 已持久化的队列条目，id 单调递增且不复用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolEntry {
    pub id: i64,
    pub data_type: String,
    pub device: String,
    pub payload: String,
    pub enqueued_at_ms: i64,
}

/// 入队结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueueReceipt {
    pub id: i64,
    /// 因容量淘汰的最旧条目数。
    pub evicted: u64,
}

/// 队列满时的处理策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// 拒绝新条目（数据丢失在最新一侧）。
    RejectNewest,
    /// 淘汰最旧条目后写入。
    EvictOldest,
}

/// 队列容量配置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpoolCapacity {
    pub max_entries: u64,
    pub overflow: OverflowPolicy,
}

impl Default for SpoolCapacity {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            overflow: OverflowPolicy::RejectNewest,
        }
    }
}

impl SpoolCapacity {
    pub(crate) fn sanitized(mut self) -> Self {
        if self.max_entries == 0 {
            self.max_entries = 1;
        }
        self
    }
}
