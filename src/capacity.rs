//! # 容量规划
//!
//! 在写入任何数据之前判断图像能否容纳整个数据流。

use crate::error::{Result, StegoError};
use crate::layout::Field;

/// 容量检查通过后的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Sufficient { required: u64, available: u64 },
}

/// 计算嵌入全部字段所需的位数 (即像素字节数)。
///
/// `8*|magic| + 32 + 8*|extension| + 32 + 8*|payload|`
pub fn required_bits(magic_len: usize, extension_len: usize, payload_len: u64) -> u64 {
    Field::Magic.carrier_bytes(magic_len as u64)
        + Field::ExtensionLen.carrier_bytes(1)
        + Field::Extension.carrier_bytes(extension_len as u64)
        + Field::PayloadLen.carrier_bytes(1)
        + Field::Payload.carrier_bytes(payload_len)
}

/// 检查 `pixel_data_bytes` 个像素字节是否足以容纳数据流。
///
/// # Errors
///
/// 所需位数超过可用像素字节数时返回 [`StegoError::InsufficientCapacity`]。
pub fn plan(
    pixel_data_bytes: u64,
    magic_len: usize,
    extension_len: usize,
    payload_len: u64,
) -> Result<Capacity> {
    let required = required_bits(magic_len, extension_len, payload_len);

    if required > pixel_data_bytes {
        return Err(StegoError::InsufficientCapacity {
            required,
            available: pixel_data_bytes,
        });
    }

    Ok(Capacity::Sufficient {
        required,
        available: pixel_data_bytes,
    })
}
