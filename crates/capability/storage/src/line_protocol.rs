//! InfluxDB Line Protocol 编码。
//!
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp
//! ```
//!
//! 标签与字段按键排序输出；时间戳按写入精度换算。
//! 换行是行分隔符，任何位置的 `\n` / `\r` 都先替换为空格，一个点始终只占一行。

use domain::{FieldValue, TimePrecision, TimeSeriesPoint};

/// 单个点编码为一行；字段为空时返回 None（InfluxDB 要求至少一个字段）。
pub fn encode_point(point: &TimeSeriesPoint, precision: TimePrecision) -> Option<String> {
    if point.fields.is_empty() {
        return None;
    }
    let mut line = escape_measurement(&point.measurement);
    for (key, value) in &point.tags {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }
    line.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&encode_field(value));
    }
    line.push(' ');
    line.push_str(&point.timestamp_in(precision).to_string());
    Some(line)
}

/// 整批编码，行之间以换行分隔。
pub fn encode_points(points: &[TimeSeriesPoint], precision: TimePrecision) -> String {
    points
        .iter()
        .filter_map(|point| encode_point(point, precision))
        .collect::<Vec<_>>()
        .join("\n")
}

fn encode_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{}", v),
        FieldValue::Integer(v) => format!("{}i", v),
        FieldValue::Boolean(v) => v.to_string(),
        FieldValue::String(v) => {
            let escaped = strip_line_breaks(v)
                .replace('\\', "\\\\")
                .replace('"', "\\\"");
            format!("\"{}\"", escaped)
        }
    }
}

/// measurement 中逗号与空格需转义。
fn escape_measurement(s: &str) -> String {
    strip_line_breaks(s).replace(',', "\\,").replace(' ', "\\ ")
}

/// 标签键、标签值、字段键中逗号、等号与空格需转义。
fn escape_key(s: &str) -> String {
    strip_line_breaks(s)
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn strip_line_breaks(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}
