//! 设备元数据。
//!
//! 注册表中每台设备保存一份 JSON blob，查询时解析为 [`DeviceInfo`] 快照。
//! blob 中缺失的字段使用默认值，未知字段直接忽略。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DEFAULT_FRIENDLY_NAME: &str = "box01";
const DEFAULT_LOCATION: &str = "unknown";
const DEFAULT_TARGET_DATABASE: &str = "daqopen";
const DEFAULT_AGGREGATED_MEASUREMENT: &str = "agg_data";

/// 设备元数据快照（只读，按次查询）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub friendly_name: String,
    pub location: String,
    /// 时序库中的目标数据库名。
    pub target_database: String,
    /// 聚合数据写入的 measurement 名。
    pub aggregated_data_measurement: String,
    /// 设备采集配置（不透明，原样保留）。
    pub daqinfo: Map<String, Value>,
    /// 最后在线时间（RFC 3339 文本，网关不解释）。
    pub last_seen: Option<String>,
}

/// 注册表 blob。缺失或显式为 null 的字段都取默认值。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeviceInfoBlob {
    friendly_name: Option<String>,
    location: Option<String>,
    target_database: Option<String>,
    aggregated_data_measurement: Option<String>,
    daqinfo: Option<Map<String, Value>>,
    last_seen: Option<String>,
}

impl DeviceInfo {
    /// 全部字段取默认值的设备。
    pub fn new(device_id: impl Into<String>) -> Self {
        let defaults = DeviceInfoBlob::default();
        Self::from_parts(device_id.into(), defaults)
    }

    /// 从注册表 blob 构造；`device_id` 始终取注册表主键。
    pub fn from_blob(device_id: impl Into<String>, blob: &str) -> Result<Self, serde_json::Error> {
        let parsed: DeviceInfoBlob = serde_json::from_str(blob)?;
        Ok(Self::from_parts(device_id.into(), parsed))
    }

    /// 序列化为注册表 blob（不含 device_id）。
    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("device_id");
        }
        serde_json::to_string(&value)
    }

    fn from_parts(device_id: String, blob: DeviceInfoBlob) -> Self {
        Self {
            device_id,
            friendly_name: or_default(blob.friendly_name, DEFAULT_FRIENDLY_NAME),
            location: or_default(blob.location, DEFAULT_LOCATION),
            target_database: or_default(blob.target_database, DEFAULT_TARGET_DATABASE),
            aggregated_data_measurement: or_default(
                blob.aggregated_data_measurement,
                DEFAULT_AGGREGATED_MEASUREMENT,
            ),
            daqinfo: blob.daqinfo.unwrap_or_default(),
            last_seen: blob.last_seen,
        }
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value.unwrap_or_else(|| default.to_string())
}
