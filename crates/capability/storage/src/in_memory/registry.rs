//! 设备注册表内存实现

use crate::error::StorageError;
use crate::traits::DeviceRegistry;
use domain::DeviceInfo;
use std::collections::HashMap;
use std::sync::RwLock;

/// 设备注册表内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
pub struct InMemoryDeviceRegistry {
    devices: RwLock<HashMap<String, DeviceInfo>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// 写入或覆盖一台设备
    pub fn register(&self, device: DeviceInfo) -> Result<(), StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(device.device_id.clone(), device);
        Ok(())
    }

    /// 移除设备
    pub fn remove(&self, device_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.remove(device_id).is_some())
    }
}

impl Default for InMemoryDeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn lookup(&self, device_id: &str) -> Result<Option<DeviceInfo>, StorageError> {
        let map = self
            .devices
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(device_id).cloned())
    }
}
