//! 采集流水线：分发 → 写入 → 落盘重试。
//!
//! - [`Dispatcher`]：处理一条总线消息，写入失败时入队
//! - [`StoreWriter`]：带超时的单次写入，失败只返回 false
//! - [`RetryLoop`]：后台按 FIFO 重放队列条目，失败按指数退避

pub mod dispatcher;
pub mod record;
pub mod retry;
pub mod writer;

pub use dispatcher::{DispatchOutcome, Dispatcher, DropReason};
pub use record::SpooledRecord;
pub use retry::{Backoff, RetryConfig, RetryLoop, RetryStep};
pub use writer::StoreWriter;

/// Pipeline 处理错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid spool record: {0}")]
    Record(String),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
