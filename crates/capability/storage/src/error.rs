//! 存储层错误类型
//!
//! 定义统一的存储错误类型，用于封装底层错误：
//! - SQL 执行错误
//! - 序列化错误
//! - 时序库 HTTP 错误
//!
//! 持久化队列另有 [`SpoolError`]，用于区分容量拒绝与 I/O 失败。

#[derive(Debug)]
pub struct StorageError {
    message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("serialization: {}", err))
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("http: {}", err))
    }
}

/// 队列写入错误。
#[derive(Debug, thiserror::Error)]
pub enum SpoolError {
    /// 队列已满且溢出策略为拒绝最新条目。
    #[error("spool full: {0} entries")]
    Full(u64),
    #[error("spool storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for SpoolError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.into())
    }
}
