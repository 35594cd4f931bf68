use daq_storage::TimeSeriesStore;
use domain::{TimePrecision, TimeSeriesPoint};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 时序库写入器。
///
/// 每次调用只尝试一次；连接错误、时序库拒绝与超时都折叠为 `false`。
pub struct StoreWriter {
    store: Arc<dyn TimeSeriesStore>,
    timeout: Duration,
}

impl StoreWriter {
    pub fn new(store: Arc<dyn TimeSeriesStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn write(
        &self,
        points: &[TimeSeriesPoint],
        database: &str,
        precision: TimePrecision,
    ) -> bool {
        let started = Instant::now();
        let result = tokio::time::timeout(
            self.timeout,
            self.store.write_points(points, database, precision),
        )
        .await;
        match result {
            Ok(Ok(())) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                daq_telemetry::record_write_latency_ms(latency_ms);
                daq_telemetry::record_write_success(points.len() as u64);
                debug!(
                    target: "daq.pipeline",
                    database,
                    points = points.len(),
                    latency_ms,
                    "points_written"
                );
                true
            }
            Ok(Err(err)) => {
                daq_telemetry::record_write_failure();
                warn!(target: "daq.pipeline", database, error = %err, "store_write_failed");
                false
            }
            Err(_) => {
                daq_telemetry::record_write_failure();
                warn!(
                    target: "daq.pipeline",
                    database,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "store_write_timeout"
                );
                false
            }
        }
    }
}
