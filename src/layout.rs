//! # 数据流布局
//!
//! 定义嵌入像素数据的字段顺序及每个字段占用的像素字节数，
//! 以及从 BMP 头部读取图像几何信息。编码与解码两侧共享这里的定义。

use crate::constants::{
    BITS_PER_BYTE, BITS_PER_LENGTH, BMP_HEADER_SIZE, BMP_HEIGHT_OFFSET, BMP_WIDTH_OFFSET,
    BYTES_PER_PIXEL,
};
use std::fmt;

/// 嵌入数据流中的一个字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Magic,
    ExtensionLen,
    Extension,
    PayloadLen,
    Payload,
}

impl Field {
    /// 字段写入与读取的固定顺序。
    pub const ORDER: [Field; 5] = [
        Field::Magic,
        Field::ExtensionLen,
        Field::Extension,
        Field::PayloadLen,
        Field::Payload,
    ];

    /// 字段中每个单元 (字节或长度值) 占用的像素字节数。
    pub const fn carrier_width(self) -> usize {
        match self {
            Field::ExtensionLen | Field::PayloadLen => BITS_PER_LENGTH,
            Field::Magic | Field::Extension | Field::Payload => BITS_PER_BYTE,
        }
    }

    /// 长度为 `units` 的字段需要的像素字节数。
    pub fn carrier_bytes(self, units: u64) -> u64 {
        units * self.carrier_width() as u64
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Magic => "magic marker",
            Field::ExtensionLen => "extension length",
            Field::Extension => "extension",
            Field::PayloadLen => "payload length",
            Field::Payload => "payload",
        };
        f.write_str(name)
    }
}

/// 从 BMP 头部读出的图像尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpGeometry {
    pub width: u32,
    pub height: u32,
}

impl BmpGeometry {
    /// 读取偏移 18 (宽度) 与 22 (高度) 处的小端序整数。
    ///
    /// 高度为负表示自上而下存储的位图，这里只取其绝对值。
    pub fn from_header(header: &[u8; BMP_HEADER_SIZE]) -> Self {
        let read_i32 = |offset: usize| {
            i32::from_le_bytes([
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ])
        };

        Self {
            width: read_i32(BMP_WIDTH_OFFSET).unsigned_abs(),
            height: read_i32(BMP_HEIGHT_OFFSET).unsigned_abs(),
        }
    }

    /// 像素数据区的字节数：`width * height * 3`。
    pub fn pixel_data_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * BYTES_PER_PIXEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with(width: i32, height: i32) -> [u8; BMP_HEADER_SIZE] {
        let mut header = [0u8; BMP_HEADER_SIZE];
        header[BMP_WIDTH_OFFSET..BMP_WIDTH_OFFSET + 4].copy_from_slice(&width.to_le_bytes());
        header[BMP_HEIGHT_OFFSET..BMP_HEIGHT_OFFSET + 4].copy_from_slice(&height.to_le_bytes());
        header
    }

    #[test]
    fn geometry_reads_little_endian_dimensions() {
        let geometry = BmpGeometry::from_header(&header_with(640, 480));
        assert_eq!(geometry, BmpGeometry { width: 640, height: 480 });
        assert_eq!(geometry.pixel_data_bytes(), 640 * 480 * 3);
    }

    #[test]
    fn top_down_bitmap_counts_absolute_height() {
        let geometry = BmpGeometry::from_header(&header_with(10, -20));
        assert_eq!(geometry.height, 20);
        assert_eq!(geometry.pixel_data_bytes(), 600);
    }

    #[test]
    fn length_fields_use_wide_carriers() {
        assert_eq!(Field::ExtensionLen.carrier_bytes(1), 32);
        assert_eq!(Field::Payload.carrier_bytes(3), 24);
        assert_eq!(Field::ORDER.first(), Some(&Field::Magic));
        assert_eq!(Field::ORDER.last(), Some(&Field::Payload));
    }
}
