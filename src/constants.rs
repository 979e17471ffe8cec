/// BMP 文件的标准头部大小 (字节)。
/// 头部原样复制，隐写从像素数据开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// 头部中图像宽度的偏移量 (4 字节，小端序)。
pub const BMP_WIDTH_OFFSET: usize = 18;

/// 头部中图像高度的偏移量 (4 字节，小端序)。
pub const BMP_HEIGHT_OFFSET: usize = 22;

/// 24 位 BMP 每个像素占用的字节数。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 嵌入在像素数据最前面的签名，用于识别图像中是否藏有数据。
pub const MAGIC_MARKER: &[u8] = b"#*";

/// 隐藏一个字节所需的像素字节数。
/// 每个像素字节只携带 1 bit，因此 `u8` 需要 8 个像素字节。
pub const BITS_PER_BYTE: usize = 8;

/// 隐藏一个长度字段所需的像素字节数。
/// 长度按 `u32` 处理，需要 32 个像素字节。
pub const BITS_PER_LENGTH: usize = 32;

/// 编码时一次从秘密文件读取的字节数。
pub const PAYLOAD_CHUNK: usize = 4096;
