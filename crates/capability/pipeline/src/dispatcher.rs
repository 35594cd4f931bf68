//! 单条消息分发。
//!
//! topic 解析 → 注册表查询 → 解码 → 转换 → 写入；写入失败时入队。
//! 畸形输入只记日志并丢弃，结果以 [`DispatchOutcome`] 返回。

use crate::record::{SpooledRecord, now_epoch_ms};
use crate::writer::StoreWriter;
use daq_storage::{DeviceRegistry, DurableQueue, SpoolError};
use domain::{DataType, DecodedPayload, DeviceInfo, Topic};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 丢弃原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// topic 不是 5 段。
    InvalidTopic,
    UnknownDataType,
    UnknownDevice,
    /// 注册表读取失败。
    RegistryUnavailable,
    /// 未知编码、gzip/JSON 错误或结构不符。
    Decode,
    /// 转换后没有任何时序点。
    EmptyRecord,
    /// 写入失败且队列已满（拒绝最新策略）。
    SpoolRejected,
    /// 写入失败且入队失败。
    SpoolUnavailable,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTopic => "invalid_topic",
            Self::UnknownDataType => "unknown_data_type",
            Self::UnknownDevice => "unknown_device",
            Self::RegistryUnavailable => "registry_unavailable",
            Self::Decode => "decode",
            Self::EmptyRecord => "empty_record",
            Self::SpoolRejected => "spool_rejected",
            Self::SpoolUnavailable => "spool_unavailable",
        }
    }
}

/// 一条消息的处理结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Written { points: usize },
    Spooled { entry_id: i64 },
    Dropped(DropReason),
}

pub struct Dispatcher {
    registry: Arc<dyn DeviceRegistry>,
    writer: Arc<StoreWriter>,
    spool: Arc<dyn DurableQueue>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        writer: Arc<StoreWriter>,
        spool: Arc<dyn DurableQueue>,
    ) -> Self {
        Self {
            registry,
            writer,
            spool,
        }
    }

    pub async fn dispatch(&self, topic: &str, payload: &[u8]) -> DispatchOutcome {
        daq_telemetry::record_message_received();

        let Some(parsed) = Topic::parse(topic) else {
            daq_telemetry::record_dropped_invalid_topic();
            debug!(target: "daq.ingest", topic, "message_dropped_invalid_topic");
            return DispatchOutcome::Dropped(DropReason::InvalidTopic);
        };
        let Some(data_type) = DataType::parse(parsed.data_type) else {
            daq_telemetry::record_dropped_unknown_data_type();
            debug!(
                target: "daq.ingest",
                topic,
                data_type = parsed.data_type,
                "message_dropped_unknown_data_type"
            );
            return DispatchOutcome::Dropped(DropReason::UnknownDataType);
        };

        let device = match self.registry.lookup(parsed.device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                daq_telemetry::record_dropped_unknown_device();
                warn!(
                    target: "daq.ingest",
                    device_id = parsed.device_id,
                    "message_dropped_unknown_device"
                );
                return DispatchOutcome::Dropped(DropReason::UnknownDevice);
            }
            Err(err) => {
                daq_telemetry::record_registry_failure();
                error!(
                    target: "daq.ingest",
                    device_id = parsed.device_id,
                    error = %err,
                    "registry_lookup_failed"
                );
                return DispatchOutcome::Dropped(DropReason::RegistryUnavailable);
            }
        };

        let decoded = match daq_normalize::decode(payload, parsed.encoding, data_type) {
            Ok(decoded) => decoded,
            Err(err) => {
                daq_telemetry::record_dropped_decode();
                error!(
                    target: "daq.ingest",
                    device_id = parsed.device_id,
                    data_type = data_type.as_str(),
                    encoding = parsed.encoding,
                    error = %err,
                    "message_dropped_decode"
                );
                return DispatchOutcome::Dropped(DropReason::Decode);
            }
        };

        let batch = daq_normalize::transform(&decoded, &device);
        if batch.is_empty() {
            daq_telemetry::record_dropped_empty();
            debug!(
                target: "daq.ingest",
                device_id = parsed.device_id,
                data_type = data_type.as_str(),
                "message_dropped_empty"
            );
            return DispatchOutcome::Dropped(DropReason::EmptyRecord);
        }

        if self
            .writer
            .write(&batch.points, &device.target_database, batch.precision)
            .await
        {
            return DispatchOutcome::Written {
                points: batch.len(),
            };
        }
        self.spool_record(device, decoded).await
    }

    async fn spool_record(&self, device: DeviceInfo, payload: DecodedPayload) -> DispatchOutcome {
        let device_id = device.device_id.clone();
        let entry = match SpooledRecord::new(device, payload).to_entry(now_epoch_ms()) {
            Ok(entry) => entry,
            Err(err) => {
                daq_telemetry::record_spool_failure();
                error!(target: "daq.pipeline", device_id = %device_id, error = %err, "spool_encode_failed");
                return DispatchOutcome::Dropped(DropReason::SpoolUnavailable);
            }
        };
        match self.spool.enqueue(entry).await {
            Ok(receipt) => {
                daq_telemetry::record_spooled();
                if receipt.evicted > 0 {
                    daq_telemetry::record_spool_evicted(receipt.evicted);
                }
                info!(
                    target: "daq.pipeline",
                    device_id = %device_id,
                    entry_id = receipt.id,
                    evicted = receipt.evicted,
                    "entry_spooled"
                );
                DispatchOutcome::Spooled {
                    entry_id: receipt.id,
                }
            }
            Err(SpoolError::Full(max_entries)) => {
                daq_telemetry::record_spool_rejected();
                error!(target: "daq.pipeline", device_id = %device_id, max_entries, "spool_full_record_dropped");
                DispatchOutcome::Dropped(DropReason::SpoolRejected)
            }
            Err(SpoolError::Storage(err)) => {
                daq_telemetry::record_spool_failure();
                error!(target: "daq.pipeline", device_id = %device_id, error = %err, "spool_enqueue_failed");
                DispatchOutcome::Dropped(DropReason::SpoolUnavailable)
            }
        }
    }
}
