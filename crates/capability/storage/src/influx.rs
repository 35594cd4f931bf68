//! InfluxDB 时序写入实现
//!
//! 通过 InfluxDB 1.x HTTP `/write` 接口写入 line protocol：
//! `POST /write?db={database}&precision={s|u}`，204 表示已确认。
//!
//! 超时由调用方（StoreWriter）控制。

use crate::error::StorageError;
use crate::line_protocol::encode_points;
use crate::traits::TimeSeriesStore;
use domain::{TimePrecision, TimeSeriesPoint};
use tracing::debug;

/// InfluxDB 连接配置。
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

pub struct InfluxTimeSeriesStore {
    client: reqwest::Client,
    write_url: String,
    credentials: Option<(String, String)>,
}

impl InfluxTimeSeriesStore {
    pub fn new(config: InfluxConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder().build()?;
        let host = config.host.trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, config.port)
        } else {
            format!("http://{}:{}", host, config.port)
        };
        let credentials = match (config.username, config.password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        };
        Ok(Self {
            client,
            write_url: format!("{}/write", base),
            credentials,
        })
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }
}

#[async_trait::async_trait]
impl TimeSeriesStore for InfluxTimeSeriesStore {
    async fn write_points(
        &self,
        points: &[TimeSeriesPoint],
        database: &str,
        precision: TimePrecision,
    ) -> Result<(), StorageError> {
        let body = encode_points(points, precision);
        if body.is_empty() {
            return Ok(());
        }
        let mut query = vec![("db", database), ("precision", precision.as_influx())];
        if let Some((username, password)) = &self.credentials {
            query.push(("u", username.as_str()));
            query.push(("p", password.as_str()));
        }
        let response = self
            .client
            .post(&self.write_url)
            .query(&query)
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            debug!(target: "daq.storage", database, points = points.len(), "influx_write_ok");
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        Err(StorageError::new(format!(
            "influx write rejected: {} {}",
            status,
            detail.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_url_adds_scheme_when_missing() {
        let store = InfluxTimeSeriesStore::new(InfluxConfig {
            host: "localhost".to_string(),
            port: 8086,
            username: None,
            password: None,
        })
        .expect("store");
        assert_eq!(store.write_url(), "http://localhost:8086/write");

        let store = InfluxTimeSeriesStore::new(InfluxConfig {
            host: "https://influx.example/".to_string(),
            port: 443,
            username: None,
            password: None,
        })
        .expect("store");
        assert_eq!(store.write_url(), "https://influx.example:443/write");
    }
}
