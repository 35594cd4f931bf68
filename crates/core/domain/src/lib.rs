pub mod data;
pub mod device;
pub mod payload;
pub mod point;
pub mod topic;

pub use data::{DataType, Encoding, RawMessage};
pub use device::DeviceInfo;
pub use payload::{
    AggregatedPayload, AggregatedValue, DataseriesChannel, DataseriesPayload, DecodedPayload,
    EventPayload,
};
pub use point::{FieldValue, PointBatch, TimePrecision, TimeSeriesPoint};
pub use topic::Topic;
