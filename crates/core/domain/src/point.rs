use std::collections::BTreeMap;

/// 时间戳精度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimePrecision {
    Second,
    Microsecond,
}

impl TimePrecision {
    /// InfluxDB `precision` 参数取值。
    pub fn as_influx(&self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Microsecond => "u",
        }
    }

    fn per_second(&self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Microsecond => 1_000_000,
        }
    }
}

/// 字段值。转换阶段已排除 null 与非有限浮点数。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// 单个时序点。
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: i64,
    pub precision: TimePrecision,
}

impl TimeSeriesPoint {
    /// 以指定精度表示的时间戳。
    pub fn timestamp_in(&self, precision: TimePrecision) -> i64 {
        if self.precision == precision {
            return self.timestamp;
        }
        let from = self.precision.per_second();
        let to = precision.per_second();
        if to > from {
            self.timestamp.saturating_mul(to / from)
        } else {
            self.timestamp.div_euclid(from / to)
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// 同一次写入的点集合，共用一个精度。
#[derive(Debug, Clone, PartialEq)]
pub struct PointBatch {
    pub precision: TimePrecision,
    pub points: Vec<TimeSeriesPoint>,
}

impl PointBatch {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}
