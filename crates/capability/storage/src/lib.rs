//! # DAQ Storage 模块
//!
//! 本模块为采集网关提供三类外部存储的统一抽象与实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：DeviceRegistry、DurableQueue、TimeSeriesStore
//! 2. **数据模型层** (`models.rs`)：队列条目与容量策略
//! 3. **错误处理层** (`error.rs`)：StorageError、SpoolError
//! 4. **连接管理层** (`connection.rs`)：SQLite 连接池
//! 5. **实现层**：
//!    - `sqlite/`：设备注册表与持久化队列（生产使用）
//!    - `influx.rs` + `line_protocol.rs`：InfluxDB HTTP 写入（生产使用）
//!    - `in_memory/`：内存实现（测试使用）
//!
//! ## 核心约束
//!
//! - **注册表无缓存**：每次 `lookup` 都读取后端，设备元数据修改立即生效
//! - **队列 FIFO**：条目按自增 id 升序重试，id 不复用
//! - **单写者**：队列实现内部持锁完成入队/读取/删除，锁不跨越时序库写入
//! - **有界队列**：`SpoolCapacity` 规定最大条目数与溢出策略
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use daq_storage::{DurableQueue, SpoolCapacity, SqliteSpool};
//!
//! let spool = SqliteSpool::connect("spool.sq3", SpoolCapacity::default()).await?;
//! if let Some(entry) = spool.peek_oldest().await? {
//!     // 重新写入成功后删除
//!     spool.delete(entry.id).await?;
//! }
//! ```
//!
//! ## 幂等性依赖
//!
//! 写入成功但删除队列条目前进程崩溃时，同一批点会被再次写入。
//! 这里依赖时序库对相同 (measurement, 标签集, 时间戳) 的写入做覆盖（InfluxDB 满足）。

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod influx;
pub mod line_protocol;
pub mod models;
pub mod sqlite;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use influx::{InfluxConfig, InfluxTimeSeriesStore};
pub use models::*;
pub use traits::*;

pub use in_memory::{InMemoryDeviceRegistry, InMemorySpool, InMemoryTimeSeriesStore, WrittenBatch};
pub use sqlite::{SqliteDeviceRegistry, SqliteSpool};
