//! 网关运行配置加载。
//!
//! 所有配置来自 `DAQOPEN_` 前缀的环境变量，均有默认值；
//! 数值无法解析时返回 `ConfigError::Invalid`；超时与重试间隔不能为 0。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 队列满时的处理策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolOverflow {
    RejectNewest,
    EvictOldest,
}

impl SpoolOverflow {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject_newest" => Some(Self::RejectNewest),
            "evict_oldest" => Some(Self::EvictOldest),
            _ => None,
        }
    }
}

/// 网关运行配置。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub env: String,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_client_id: String,
    pub topic_prefix: String,
    pub config_db_path: String,
    pub influxdb_host: String,
    pub influxdb_port: u16,
    pub influxdb_username: Option<String>,
    pub influxdb_password: Option<String>,
    pub write_timeout_ms: u64,
    pub spool_path: String,
    pub spool_max_entries: u64,
    pub spool_overflow: SpoolOverflow,
    pub retry_idle_ms: u64,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    /// 运维 HTTP 监听地址；None 表示不启动。
    pub http_addr: Option<String>,
}

impl GatewayConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置（测试中以 HashMap 代替环境变量）。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let mqtt_client_id = vars.string("DAQOPEN_MQTT_CLIENT_ID", "daqopen-gateway");
        let spool_overflow = match vars.optional("DAQOPEN_SPOOL_OVERFLOW") {
            Some(value) => SpoolOverflow::parse(&value).ok_or_else(|| {
                ConfigError::Invalid("DAQOPEN_SPOOL_OVERFLOW".to_string(), value)
            })?,
            None => SpoolOverflow::RejectNewest,
        };
        let http_addr = match (vars.lookup)("DAQOPEN_HTTP_ADDR") {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value),
            None => Some("127.0.0.1:8090".to_string()),
        };

        Ok(Self {
            env: vars.string("DAQOPEN_ENV", "development"),
            mqtt_host: vars.string("DAQOPEN_MQTT_HOST", "localhost"),
            mqtt_port: vars.u16_with_default("DAQOPEN_MQTT_PORT", 1883)?,
            mqtt_username: vars.optional("DAQOPEN_MQTT_USERNAME"),
            mqtt_password: vars.optional("DAQOPEN_MQTT_PASSWORD"),
            mqtt_client_id,
            topic_prefix: vars
                .string("DAQOPEN_TOPIC_PREFIX", "dt/pqopen")
                .trim_end_matches('/')
                .to_string(),
            config_db_path: vars.string("DAQOPEN_CONFIG_DB_PATH", "../devices.sq3"),
            influxdb_host: vars.string("DAQOPEN_INFLUXDB_HOST", "localhost"),
            influxdb_port: vars.u16_with_default("DAQOPEN_INFLUXDB_PORT", 8086)?,
            influxdb_username: vars.optional("DAQOPEN_INFLUXDB_USERNAME"),
            influxdb_password: vars.optional("DAQOPEN_INFLUXDB_PASSWORD"),
            write_timeout_ms: vars.positive_u64_with_default("DAQOPEN_WRITE_TIMEOUT_MS", 10_000)?,
            spool_path: vars.string("DAQOPEN_SPOOL_PATH", "spool.sq3"),
            spool_max_entries: vars.u64_with_default("DAQOPEN_SPOOL_MAX_ENTRIES", 100_000)?,
            spool_overflow,
            retry_idle_ms: vars.positive_u64_with_default("DAQOPEN_RETRY_IDLE_MS", 1_000)?,
            retry_base_ms: vars.positive_u64_with_default("DAQOPEN_RETRY_BASE_MS", 1_000)?,
            retry_max_ms: vars.positive_u64_with_default("DAQOPEN_RETRY_MAX_MS", 60_000)?,
            http_addr,
        })
    }

    /// 是否为开发环境（开发环境下加载 `.env`）。
    pub fn is_development(&self) -> bool {
        self.env.eq_ignore_ascii_case("development")
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        match (self.lookup)(key) {
            Some(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn u16_with_default(&self, key: &str, default: u16) -> Result<u16, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        value
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value))
    }

    fn u64_with_default(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value))
    }

    fn positive_u64_with_default(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        match self.u64_with_default(key, default)? {
            0 => Err(ConfigError::Invalid(key.to_string(), "0".to_string())),
            value => Ok(value),
        }
    }
}
