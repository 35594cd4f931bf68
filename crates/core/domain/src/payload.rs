//! 按数据类型解码后的载荷。

use crate::data::DataType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 聚合数据：`{timestamp, interval_sec, data: {channel -> 标量 | 数组}}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPayload {
    /// epoch 秒。
    pub timestamp: f64,
    pub interval_sec: i64,
    pub data: BTreeMap<String, AggregatedValue>,
}

/// 聚合通道值。数组中的 `null` 表示该序号无效（NaN）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregatedValue {
    Scalar(Option<f64>),
    Series(Vec<Option<f64>>),
    /// 非数值（字符串、对象等），转换时忽略。
    Other(Value),
}

/// 原始采样序列：`{data: {channel -> {timestamps, data}}}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataseriesPayload {
    pub data: BTreeMap<String, DataseriesChannel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataseriesChannel {
    /// epoch 微秒。
    pub timestamps: Vec<f64>,
    pub data: Vec<Option<f64>>,
}

/// 事件：`{timestamp, event_type, channel, data}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// epoch 秒（可带小数）。
    pub timestamp: f64,
    pub event_type: String,
    pub channel: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// 已通过结构校验的载荷。
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    Aggregated(AggregatedPayload),
    Dataseries(DataseriesPayload),
    Event(EventPayload),
}

impl DecodedPayload {
    /// 按数据类型把通用 JSON 映射为具体结构。
    pub fn from_value(data_type: DataType, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match data_type {
            DataType::Aggregated => Self::Aggregated(serde_json::from_value(value)?),
            DataType::Dataseries => Self::Dataseries(serde_json::from_value(value)?),
            DataType::Event => Self::Event(serde_json::from_value(value)?),
        })
    }

    pub fn from_json(data_type: DataType, text: &str) -> Result<Self, serde_json::Error> {
        Ok(match data_type {
            DataType::Aggregated => Self::Aggregated(serde_json::from_str(text)?),
            DataType::Dataseries => Self::Dataseries(serde_json::from_str(text)?),
            DataType::Event => Self::Event(serde_json::from_str(text)?),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Aggregated(payload) => serde_json::to_string(payload),
            Self::Dataseries(payload) => serde_json::to_string(payload),
            Self::Event(payload) => serde_json::to_string(payload),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Aggregated(_) => DataType::Aggregated,
            Self::Dataseries(_) => DataType::Dataseries,
            Self::Event(_) => DataType::Event,
        }
    }
}
