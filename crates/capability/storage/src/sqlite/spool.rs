//! SQLite 持久化队列实现
//!
//! 表结构：
//!
//! ```sql
//! CREATE TABLE spool (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     data_type TEXT NOT NULL,
//!     device TEXT NOT NULL,
//!     payload TEXT NOT NULL,
//!     enqueued_at_ms INTEGER NOT NULL
//! );
//! ```
//!
//! 设计要点：
//! - AUTOINCREMENT 保证 id 单调递增、删除后不复用
//! - 表在首次访问时创建（文件中可能尚无此表）
//! - 所有操作在同一把 `tokio::sync::Mutex` 下执行，单写者；锁只覆盖 SQLite 操作本身

use crate::error::{SpoolError, StorageError};
use crate::models::{EnqueueReceipt, NewSpoolEntry, OverflowPolicy, SpoolCapacity, SpoolEntry};
use crate::traits::DurableQueue;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::warn;

struct SpoolState {
    schema_ready: bool,
}

pub struct SqliteSpool {
    pool: SqlitePool,
    capacity: SpoolCapacity,
    state: Mutex<SpoolState>,
}

impl SqliteSpool {
    pub fn new(pool: SqlitePool, capacity: SpoolCapacity) -> Self {
        Self {
            pool,
            capacity: capacity.sanitized(),
            state: Mutex::new(SpoolState {
                schema_ready: false,
            }),
        }
    }

    /// 打开队列文件，不存在时创建。
    pub async fn connect(path: &str, capacity: SpoolCapacity) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_sqlite(path, true, 1).await?;
        Ok(Self::new(pool, capacity))
    }

    pub fn capacity(&self) -> SpoolCapacity {
        self.capacity
    }

    async fn ensure_schema(&self, state: &mut SpoolState) -> Result<(), StorageError> {
        if state.schema_ready {
            return Ok(());
        }
        sqlx::query(
            "create table if not exists spool (\
             id integer primary key autoincrement, \
             data_type text not null, \
             device text not null, \
             payload text not null, \
             enqueued_at_ms integer not null)",
        )
        .execute(&self.pool)
        .await?;
        state.schema_ready = true;
        Ok(())
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<SpoolEntry, sqlx::Error> {
    Ok(SpoolEntry {
        id: row.try_get("id")?,
        data_type: row.try_get("data_type")?,
        device: row.try_get("device")?,
        payload: row.try_get("payload")?,
        enqueued_at_ms: row.try_get("enqueued_at_ms")?,
    })
}

#[async_trait::async_trait]
impl DurableQueue for SqliteSpool {
    async fn enqueue(&self, entry: NewSpoolEntry) -> Result<EnqueueReceipt, SpoolError> {
        let mut state = self.state.lock().await;
        self.ensure_schema(&mut state).await?;

        let mut tx = self.pool.begin().await?;
        let count: i64 = sqlx::query_scalar("select count(*) from spool")
            .fetch_one(&mut *tx)
            .await?;
        let count = u64::try_from(count).unwrap_or_default();
        let mut evicted = 0;
        if count >= self.capacity.max_entries {
            match self.capacity.overflow {
                OverflowPolicy::RejectNewest => {
                    return Err(SpoolError::Full(self.capacity.max_entries));
                }
                OverflowPolicy::EvictOldest => {
                    let excess = count - self.capacity.max_entries + 1;
                    let result = sqlx::query(
                        "delete from spool where id in \
                         (select id from spool order by id asc limit ?1)",
                    )
                    .bind(i64::try_from(excess).unwrap_or(i64::MAX))
                    .execute(&mut *tx)
                    .await?;
                    evicted = result.rows_affected();
                    warn!(target: "daq.storage", evicted, "spool_evicted_oldest");
                }
            }
        }

        let result = sqlx::query(
            "insert into spool (data_type, device, payload, enqueued_at_ms) \
             values (?1, ?2, ?3, ?4)",
        )
        .bind(&entry.data_type)
        .bind(&entry.device)
        .bind(&entry.payload)
        .bind(entry.enqueued_at_ms)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(EnqueueReceipt {
            id: result.last_insert_rowid(),
            evicted,
        })
    }

    async fn peek_oldest(&self) -> Result<Option<SpoolEntry>, StorageError> {
        let mut state = self.state.lock().await;
        self.ensure_schema(&mut state).await?;
        let row = sqlx::query(
            "select id, data_type, device, payload, enqueued_at_ms \
             from spool order by id asc limit 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        self.ensure_schema(&mut state).await?;
        sqlx::query("delete from spool where id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn len(&self) -> Result<u64, StorageError> {
        let mut state = self.state.lock().await;
        self.ensure_schema(&mut state).await?;
        let count: i64 = sqlx::query_scalar("select count(*) from spool")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
