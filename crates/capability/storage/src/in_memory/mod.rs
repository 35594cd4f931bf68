//! 内存存储实现模块
//!
//! 仅用于本地演示和测试。
//!
//! 包含以下实现：
//! - DeviceRegistry: InMemoryDeviceRegistry
//! - DurableQueue: InMemorySpool
//! - TimeSeriesStore: InMemoryTimeSeriesStore

pub mod registry;
pub mod spool;
pub mod timeseries;

pub use registry::*;
pub use spool::*;
pub use timeseries::*;
