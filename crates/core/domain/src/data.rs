use serde::{Deserialize, Serialize};

/// 总线上收到的原始消息。
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at_ms: i64,
}

/// 载荷的数据类型（topic 第 4 段）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Aggregated,
    Dataseries,
    Event,
}

impl DataType {
    /// 解析 topic 中的数据类型；`agg_data` 为旧设备使用的别名。
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "aggregated" | "agg_data" => Some(Self::Aggregated),
            "dataseries" => Some(Self::Dataseries),
            "event" => Some(Self::Event),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregated => "aggregated",
            Self::Dataseries => "dataseries",
            Self::Event => "event",
        }
    }
}

/// 载荷编码（topic 第 5 段）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8 JSON。
    Json,
    /// gzip 压缩后的 JSON。
    GzipJson,
}

impl Encoding {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(Self::Json),
            "gjson" => Some(Self::GzipJson),
            _ => None,
        }
    }
}
