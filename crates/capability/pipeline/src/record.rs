//! 队列条目 ↔ (数据类型, 设备快照, 载荷)。
//!
//! 设备快照与载荷都以 JSON 文本存储；设备快照包含 device_id，重放时不再查询注册表。

use crate::PipelineError;
use daq_storage::{NewSpoolEntry, SpoolEntry};
use domain::{DataType, DecodedPayload, DeviceInfo, PointBatch};

#[derive(Debug, Clone, PartialEq)]
pub struct SpooledRecord {
    pub data_type: DataType,
    pub device: DeviceInfo,
    pub payload: DecodedPayload,
}

impl SpooledRecord {
    pub fn new(device: DeviceInfo, payload: DecodedPayload) -> Self {
        Self {
            data_type: payload.data_type(),
            device,
            payload,
        }
    }

    pub fn to_entry(&self, enqueued_at_ms: i64) -> Result<NewSpoolEntry, PipelineError> {
        Ok(NewSpoolEntry {
            data_type: self.data_type.as_str().to_string(),
            device: serde_json::to_string(&self.device)?,
            payload: self.payload.to_json()?,
            enqueued_at_ms,
        })
    }

    pub fn from_entry(entry: &SpoolEntry) -> Result<Self, PipelineError> {
        let data_type = DataType::parse(&entry.data_type).ok_or_else(|| {
            PipelineError::Record(format!("unknown data type {}", entry.data_type))
        })?;
        let device: DeviceInfo = serde_json::from_str(&entry.device)?;
        let payload = DecodedPayload::from_json(data_type, &entry.payload)?;
        Ok(Self {
            data_type,
            device,
            payload,
        })
    }

    /// 重新生成时序点。
    pub fn points(&self) -> PointBatch {
        daq_normalize::transform(&self.payload, &self.device)
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
