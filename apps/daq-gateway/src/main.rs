//! DAQ 采集网关进程。
//!
//! 装配顺序：配置 → 日志 → 注册表/队列/时序库 → 重试循环 → MQTT 采集 → 运维 HTTP。
//! ctrl-c 后停止采集，等待当前写入完成后退出重试循环。

mod handlers;
mod ingest;
mod routes;

use daq_config::{GatewayConfig, SpoolOverflow};
use daq_pipeline::{Dispatcher, StoreWriter};
use daq_storage::{
    DurableQueue, InfluxConfig, InfluxTimeSeriesStore, OverflowPolicy, SpoolCapacity,
    SqliteDeviceRegistry, SqliteSpool,
};
use daq_telemetry::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub spool: Arc<dyn DurableQueue>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 开发环境（默认）加载本地 .env
    let env = std::env::var("DAQOPEN_ENV").unwrap_or_else(|_| "development".to_string());
    if env.eq_ignore_ascii_case("development") {
        dotenvy::dotenv().ok();
    }
    let config = GatewayConfig::from_env()?;
    init_tracing();
    info!(env = %config.env, "daq_gateway_starting");

    // 设备注册表由外部工具维护，文件不存在时直接启动失败
    let registry = Arc::new(SqliteDeviceRegistry::connect(&config.config_db_path).await?);
    info!(path = %config.config_db_path, "device_registry_opened");

    let capacity = SpoolCapacity {
        max_entries: config.spool_max_entries,
        overflow: match config.spool_overflow {
            SpoolOverflow::RejectNewest => OverflowPolicy::RejectNewest,
            SpoolOverflow::EvictOldest => OverflowPolicy::EvictOldest,
        },
    };
    let spool: Arc<dyn DurableQueue> =
        Arc::new(SqliteSpool::connect(&config.spool_path, capacity).await?);
    info!(
        path = %config.spool_path,
        max_entries = capacity.max_entries,
        pending = spool.len().await?,
        "spool_opened"
    );

    let store = Arc::new(InfluxTimeSeriesStore::new(InfluxConfig {
        host: config.influxdb_host.clone(),
        port: config.influxdb_port,
        username: config.influxdb_username.clone(),
        password: config.influxdb_password.clone(),
    })?);
    let writer = Arc::new(StoreWriter::new(
        store,
        Duration::from_millis(config.write_timeout_ms),
    ));
    let dispatcher = Arc::new(Dispatcher::new(registry, writer.clone(), spool.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let retry_task = ingest::spawn_retry(&config, spool.clone(), writer, shutdown_rx.clone());
    let ingest_task = ingest::spawn_ingest(&config, dispatcher, shutdown_rx.clone());

    // 运维端点：/health、/metrics
    let http_task = match &config.http_addr {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(addr = %addr, "ops_http_listening");
            let app = routes::create_router()
                .with_state(AppState {
                    spool: spool.clone(),
                })
                .layer(TraceLayer::new_for_http());
            let mut stop = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                let result = axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = stop.wait_for(|stop| *stop).await;
                    })
                    .await;
                if let Err(err) = result {
                    warn!(error = %err, "ops_http_stopped");
                }
            }))
        }
        None => None,
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown_requested");
    let _ = shutdown_tx.send(true);
    // 先等采集任务：进行中的分发可能还要写入或入队
    if let Err(err) = ingest_task.await {
        warn!(error = %err, "ingest_task_join_failed");
    }
    if let Err(err) = retry_task.await {
        warn!(error = %err, "retry_task_join_failed");
    }
    if let Some(task) = http_task {
        let _ = task.await;
    }
    info!("daq_gateway_stopped");
    Ok(())
}
