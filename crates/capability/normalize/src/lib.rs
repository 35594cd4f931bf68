//! 载荷解码与时序点转换。
//!
//! - [`decode`]：字节 + 编码标签 → 通用 JSON → 按数据类型校验后的载荷
//! - [`transform`]：(载荷, 设备元数据) → 时序点，每种数据类型一个纯函数

pub mod decode;
pub mod transform;

pub use decode::{DecodeError, decode, decode_payload};
pub use transform::{
    DATASERIES_MEASUREMENT, EVENT_MEASUREMENT, aggregated_points, dataseries_points, event_points,
    transform,
};
