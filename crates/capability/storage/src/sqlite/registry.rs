//! SQLite 设备注册表实现
//!
//! 表结构：
//!
//! ```sql
//! CREATE TABLE devices (
//!     device_id TEXT PRIMARY KEY,
//!     device_info TEXT NOT NULL
//! );
//! ```

use crate::error::StorageError;
use crate::traits::DeviceRegistry;
use domain::DeviceInfo;
use sqlx::{Row, SqlitePool};

pub struct SqliteDeviceRegistry {
    pub pool: SqlitePool,
}

impl SqliteDeviceRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 打开已有的注册表文件（不创建）。
    pub async fn connect(path: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_sqlite(path, false, 4).await?;
        Ok(Self { pool })
    }

    /// 建表（注册表由外部工具维护，此处用于初始化与测试）。
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            "create table if not exists devices (\
             device_id text primary key, \
             device_info text not null)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 写入或覆盖一台设备。
    pub async fn register(&self, device: &DeviceInfo) -> Result<(), StorageError> {
        let blob = device.to_blob()?;
        sqlx::query(
            "insert into devices (device_id, device_info) values (?1, ?2) \
             on conflict(device_id) do update set device_info = excluded.device_info",
        )
        .bind(&device.device_id)
        .bind(blob)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DeviceRegistry for SqliteDeviceRegistry {
    async fn lookup(&self, device_id: &str) -> Result<Option<DeviceInfo>, StorageError> {
        let row = sqlx::query("select device_info from devices where device_id = ?1")
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let blob: String = row.try_get("device_info")?;
        let device = DeviceInfo::from_blob(device_id, &blob)
            .map_err(|err| StorageError::new(format!("device {}: {}", device_id, err)))?;
        Ok(Some(device))
    }
}
