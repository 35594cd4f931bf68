//! 载荷 → 时序点。
//!
//! 三个纯函数，对应三种数据类型：
//! - 聚合数据：一个标量点 + 按序号（谐波次数）转置的数组点，秒精度
//! - 采样序列：每个通道每个采样一个点，微秒精度
//! - 事件：一个点，微秒精度
//!
//! 所有字段都排除 null 与非有限浮点数。

use domain::{
    AggregatedPayload, AggregatedValue, DataseriesPayload, DecodedPayload, DeviceInfo,
    EventPayload, FieldValue, PointBatch, TimePrecision, TimeSeriesPoint,
};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DATASERIES_MEASUREMENT: &str = "dataseries";
pub const EVENT_MEASUREMENT: &str = "events";

/// 按载荷类型分派到对应的转换函数。
pub fn transform(payload: &DecodedPayload, device: &DeviceInfo) -> PointBatch {
    match payload {
        DecodedPayload::Aggregated(payload) => PointBatch {
            precision: TimePrecision::Second,
            points: aggregated_points(payload, device),
        },
        DecodedPayload::Dataseries(payload) => PointBatch {
            precision: TimePrecision::Microsecond,
            points: dataseries_points(payload, device),
        },
        DecodedPayload::Event(payload) => PointBatch {
            precision: TimePrecision::Microsecond,
            points: event_points(payload, device),
        },
    }
}

/// 聚合数据。
///
/// 输入按通道组织（每个通道一个数组），输出按序号组织：序号 i 上所有通道的有效值
/// 合并为一个带 `order` 标签（两位补零）的点，便于下游按次数做范围查询。
/// 所有通道在某序号上均无效时不产生点。
pub fn aggregated_points(payload: &AggregatedPayload, device: &DeviceInfo) -> Vec<TimeSeriesPoint> {
    let timestamp = payload.timestamp.trunc() as i64;
    let mut tags = device_tags(device);
    tags.insert("interval_sec".to_string(), payload.interval_sec.to_string());

    let mut scalar_fields = BTreeMap::new();
    let mut order_fields: BTreeMap<usize, BTreeMap<String, FieldValue>> = BTreeMap::new();
    for (channel, value) in &payload.data {
        match value {
            AggregatedValue::Scalar(Some(v)) if v.is_finite() => {
                scalar_fields.insert(channel.clone(), FieldValue::Float(*v));
            }
            AggregatedValue::Series(values) => {
                for (index, v) in values.iter().enumerate() {
                    if let Some(v) = v.filter(|v| v.is_finite()) {
                        order_fields
                            .entry(index)
                            .or_default()
                            .insert(channel.clone(), FieldValue::Float(v));
                    }
                }
            }
            _ => {}
        }
    }

    let measurement = &device.aggregated_data_measurement;
    let mut points = Vec::with_capacity(order_fields.len() + 1);
    if !scalar_fields.is_empty() {
        points.push(TimeSeriesPoint {
            measurement: measurement.clone(),
            tags: tags.clone(),
            fields: scalar_fields,
            timestamp,
            precision: TimePrecision::Second,
        });
    }
    for (index, fields) in order_fields {
        let mut order_tags = tags.clone();
        order_tags.insert("order".to_string(), format!("{:02}", index));
        points.push(TimeSeriesPoint {
            measurement: measurement.clone(),
            tags: order_tags,
            fields,
            timestamp,
            precision: TimePrecision::Second,
        });
    }
    points
}

/// 采样序列：通道数 × 采样数个点，每点一个字段。
pub fn dataseries_points(
    payload: &DataseriesPayload,
    device: &DeviceInfo,
) -> Vec<TimeSeriesPoint> {
    let tags = device_tags(device);
    let mut points = Vec::new();
    for (channel, series) in &payload.data {
        for (timestamp, value) in series.timestamps.iter().zip(series.data.iter()) {
            let Some(value) = value.filter(|v| v.is_finite()) else {
                continue;
            };
            let mut fields = BTreeMap::new();
            fields.insert(channel.clone(), FieldValue::Float(value));
            points.push(TimeSeriesPoint {
                measurement: DATASERIES_MEASUREMENT.to_string(),
                tags: tags.clone(),
                fields,
                timestamp: timestamp.round() as i64,
                precision: TimePrecision::Microsecond,
            });
        }
    }
    points
}

/// 事件：一个点，字段为事件 data 原样映射（数值、布尔、字符串）。
pub fn event_points(payload: &EventPayload, device: &DeviceInfo) -> Vec<TimeSeriesPoint> {
    let mut tags = device_tags(device);
    tags.insert("event_type".to_string(), payload.event_type.clone());
    tags.insert("channel".to_string(), payload.channel.clone());

    let fields: BTreeMap<String, FieldValue> = payload
        .data
        .iter()
        .filter_map(|(key, value)| field_from_json(value).map(|field| (key.clone(), field)))
        .collect();
    if fields.is_empty() {
        return Vec::new();
    }

    vec![TimeSeriesPoint {
        measurement: EVENT_MEASUREMENT.to_string(),
        tags,
        fields,
        timestamp: (payload.timestamp * 1_000_000.0).round() as i64,
        precision: TimePrecision::Microsecond,
    }]
}

fn field_from_json(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .filter(|v| v.is_finite())
            .map(FieldValue::Float),
        Value::Bool(v) => Some(FieldValue::Boolean(*v)),
        Value::String(v) => Some(FieldValue::String(v.clone())),
        _ => None,
    }
}

fn device_tags(device: &DeviceInfo) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    tags.insert("device_id".to_string(), device.device_id.clone());
    tags.insert("location".to_string(), device.location.clone());
    tags
}
