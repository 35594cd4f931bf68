//! 数据库连接管理
//!
//! 提供 SQLite 连接池初始化功能：
//! - connect_sqlite：打开（可选创建）SQLite 文件

use crate::error::StorageError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// 建立 SQLite 连接池
///
/// # 参数
/// - `path`：数据库文件路径
/// - `create_if_missing`：文件不存在时是否创建
/// - `max_connections`：连接池上限
pub async fn connect_sqlite(
    path: &str,
    create_if_missing: bool,
    max_connections: u32,
) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create_if_missing);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;
    Ok(pool)
}
