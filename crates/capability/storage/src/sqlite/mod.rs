//! SQLite 存储实现模块
//!
//! - DeviceRegistry：SqliteDeviceRegistry（`devices` 表，一台设备一行，元数据为 JSON blob）
//! - DurableQueue：SqliteSpool（`spool` 表，自增 id 作为 FIFO 顺序）
//!
//! 所有 SQL 使用参数绑定。

pub mod registry;
pub mod spool;

pub use registry::*;
pub use spool::*;
