//! # 编码器
//!
//! 复制 BMP 头部，按固定顺序把各字段逐位写入后续像素字节的最低位，
//! 最后把未使用的像素数据原样复制到输出。

use crate::capacity::{self, Capacity};
use crate::codec::{encode_byte, encode_u32};
use crate::constants::{BITS_PER_BYTE, BMP_HEADER_SIZE, MAGIC_MARKER, PAYLOAD_CHUNK};
use crate::error::{Result, StegoError};
use crate::layout::{BmpGeometry, Field};
use std::io::{self, Read, Write};

/// 待隐藏的秘密数据。
///
/// `len` 必须等于 `reader` 实际可读出的字节数；读取提前结束时编码失败。
pub struct Payload<R> {
    pub extension: String,
    pub len: u64,
    pub reader: R,
}

/// 编码成功后的统计信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeReport {
    /// 被写入数据流的像素字节数 (每字节 1 bit)。
    pub bits_embedded: u64,
    /// 图像像素数据区的总字节数。
    pub available: u64,
    /// 原样复制的尾部字节数。
    pub tail_bytes: u64,
}

/// 一次编码操作持有的游标状态。
///
/// 载体图像与输出以相同步长前进，`cursor` 记录已消耗的像素字节数。
pub struct EncodingSession<'a, R, W> {
    cover: &'a mut R,
    dest: &'a mut W,
    cursor: u64,
    carrier: Vec<u8>,
}

impl<'a, R: Read, W: Write> EncodingSession<'a, R, W> {
    pub fn new(cover: &'a mut R, dest: &'a mut W) -> Self {
        Self {
            cover,
            dest,
            cursor: 0,
            carrier: Vec::new(),
        }
    }

    /// 已写入数据流的像素字节数。
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// 把 `data` 的每个字节写入接下来的 8 个像素字节。
    pub fn embed_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.carrier.resize(data.len() * BITS_PER_BYTE, 0);
        self.cover.read_exact(&mut self.carrier)?;

        for (chunk, &byte) in self.carrier.chunks_exact_mut(BITS_PER_BYTE).zip(data) {
            encode_byte(byte, chunk)?;
        }

        self.dest.write_all(&self.carrier)?;
        self.cursor += self.carrier.len() as u64;
        Ok(())
    }

    /// 把长度字段 `field` 写入接下来的 32 个像素字节。
    pub fn embed_length(&mut self, field: Field, value: u32) -> Result<()> {
        let width = field.carrier_width();
        self.carrier.resize(width, 0);
        self.cover.read_exact(&mut self.carrier)?;
        encode_u32(value, &mut self.carrier)?;
        self.dest.write_all(&self.carrier)?;
        self.cursor += width as u64;
        Ok(())
    }

    /// 从 `source` 分块读取恰好 `len` 个字节并逐个嵌入。
    pub fn embed_stream<P: Read>(&mut self, source: &mut P, len: u64) -> Result<()> {
        let mut buf = vec![0u8; PAYLOAD_CHUNK];
        let mut remaining = len;

        while remaining > 0 {
            let take = remaining.min(PAYLOAD_CHUNK as u64) as usize;
            source.read_exact(&mut buf[..take])?;
            self.embed_bytes(&buf[..take])?;
            remaining -= take as u64;
        }

        Ok(())
    }

    /// 把载体中剩余的全部字节原样复制到输出，并刷新输出。
    pub fn copy_tail(&mut self) -> Result<u64> {
        let copied = io::copy(self.cover, self.dest)?;
        self.dest.flush()?;
        Ok(copied)
    }
}

fn length_field(field: Field, len: u64) -> Result<u32> {
    u32::try_from(len).map_err(|_| StegoError::LengthOverflow { field, len })
}

/// 把 `payload` 隐藏到 `cover` 的副本中，写入 `dest`。
///
/// `cover` 的读取位置必须在文件开头。容量检查在写入任何字节之前完成，
/// 因此容量不足时 `dest` 不会被写入。`on_field` 在每个字段写完后调用一次。
///
/// # Errors
///
/// * [`StegoError::InsufficientCapacity`] - 图像放不下全部字段。
/// * [`StegoError::LengthOverflow`] - 扩展名或秘密数据超出 32 位长度字段。
/// * [`StegoError::FileAccess`] - 读写失败，或载体/秘密数据提前结束。
pub fn encode<R, P, W, F>(
    cover: &mut R,
    mut payload: Payload<P>,
    dest: &mut W,
    mut on_field: F,
) -> Result<EncodeReport>
where
    R: Read,
    P: Read,
    W: Write,
    F: FnMut(Field),
{
    let mut header = [0u8; BMP_HEADER_SIZE];
    cover.read_exact(&mut header)?;

    let extension = payload.extension.as_bytes();
    let extension_len = length_field(Field::ExtensionLen, extension.len() as u64)?;
    let payload_len = length_field(Field::PayloadLen, payload.len)?;

    let Capacity::Sufficient { required, available } = capacity::plan(
        BmpGeometry::from_header(&header).pixel_data_bytes(),
        MAGIC_MARKER.len(),
        extension.len(),
        payload.len,
    )?;

    dest.write_all(&header)?;

    let mut session = EncodingSession::new(cover, dest);

    session.embed_bytes(MAGIC_MARKER)?;
    on_field(Field::Magic);

    session.embed_length(Field::ExtensionLen, extension_len)?;
    on_field(Field::ExtensionLen);

    session.embed_bytes(extension)?;
    on_field(Field::Extension);

    session.embed_length(Field::PayloadLen, payload_len)?;
    on_field(Field::PayloadLen);

    session.embed_stream(&mut payload.reader, payload.len)?;
    on_field(Field::Payload);

    debug_assert_eq!(session.cursor(), required);
    let tail_bytes = session.copy_tail()?;

    Ok(EncodeReport {
        bits_embedded: required,
        available,
        tail_bytes,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constants::{BMP_HEIGHT_OFFSET, BMP_WIDTH_OFFSET};

    /// 构造一个头部声明 `width x height`、像素字节带噪声的 24 位 BMP。
    pub(crate) fn synthetic_bmp(width: u32, height: u32) -> Vec<u8> {
        let pixel_bytes = (width * height * 3) as usize;
        let mut bmp = vec![0u8; BMP_HEADER_SIZE + pixel_bytes];
        bmp[0] = b'B';
        bmp[1] = b'M';
        bmp[BMP_WIDTH_OFFSET..BMP_WIDTH_OFFSET + 4].copy_from_slice(&width.to_le_bytes());
        bmp[BMP_HEIGHT_OFFSET..BMP_HEIGHT_OFFSET + 4].copy_from_slice(&height.to_le_bytes());
        for (i, byte) in bmp[BMP_HEADER_SIZE..].iter_mut().enumerate() {
            *byte = (i * 131 % 251) as u8;
        }
        bmp
    }

    pub(crate) fn text_payload(data: &[u8]) -> Payload<&[u8]> {
        Payload {
            extension: ".txt".to_string(),
            len: data.len() as u64,
            reader: data,
        }
    }

    #[test]
    fn encode_reports_required_bits_and_tail() {
        let cover = synthetic_bmp(100, 34);
        let mut stego = Vec::new();
        let mut fields = Vec::new();

        let report = encode(
            &mut cover.as_slice(),
            text_payload(b"hi"),
            &mut stego,
            |field| fields.push(field),
        )
        .unwrap();

        assert_eq!(report.bits_embedded, 128);
        assert_eq!(report.available, 10_200);
        assert_eq!(report.tail_bytes, 10_200 - 128);
        assert_eq!(fields, Field::ORDER);
        assert_eq!(stego.len(), cover.len());
    }

    #[test]
    fn header_and_tail_are_untouched() {
        let cover = synthetic_bmp(20, 20);
        let mut stego = Vec::new();
        let report =
            encode(&mut cover.as_slice(), text_payload(b"abc"), &mut stego, |_| {}).unwrap();

        let tail_start = BMP_HEADER_SIZE + report.bits_embedded as usize;
        assert_eq!(&stego[..BMP_HEADER_SIZE], &cover[..BMP_HEADER_SIZE]);
        assert_eq!(&stego[tail_start..], &cover[tail_start..]);
        for (before, after) in cover[BMP_HEADER_SIZE..tail_start]
            .iter()
            .zip(&stego[BMP_HEADER_SIZE..tail_start])
        {
            assert_eq!(before & 0xFE, after & 0xFE);
        }
    }

    #[test]
    fn insufficient_capacity_writes_nothing() {
        let cover = synthetic_bmp(11, 3);
        let mut stego = Vec::new();

        let result = encode(&mut cover.as_slice(), text_payload(b"hi"), &mut stego, |_| {});

        assert!(matches!(
            result,
            Err(StegoError::InsufficientCapacity {
                required: 128,
                available: 99
            })
        ));
        assert!(stego.is_empty());
    }

    #[test]
    fn length_fields_land_in_their_own_carriers() {
        use crate::codec::decode_u32;
        use crate::constants::BITS_PER_LENGTH;

        let cover = synthetic_bmp(20, 20);
        let mut stego = Vec::new();
        encode(&mut cover.as_slice(), text_payload(b"abc"), &mut stego, |_| {}).unwrap();

        let ext_len_start = BMP_HEADER_SIZE + MAGIC_MARKER.len() * BITS_PER_BYTE;
        let payload_len_start = ext_len_start + BITS_PER_LENGTH + 4 * BITS_PER_BYTE;
        assert_eq!(decode_u32(&stego[ext_len_start..]).unwrap(), 4);
        assert_eq!(decode_u32(&stego[payload_len_start..]).unwrap(), 3);
    }

    #[test]
    fn payload_longer_than_u32_is_rejected() {
        let cover = synthetic_bmp(20, 20);
        let mut stego = Vec::new();
        let payload = Payload {
            extension: ".bin".to_string(),
            len: u64::from(u32::MAX) + 1,
            reader: &b""[..],
        };

        assert!(matches!(
            encode(&mut cover.as_slice(), payload, &mut stego, |_| {}),
            Err(StegoError::LengthOverflow {
                field: Field::PayloadLen,
                ..
            })
        ));
        assert!(stego.is_empty());
    }

    #[test]
    fn short_payload_reader_fails() {
        let cover = synthetic_bmp(20, 20);
        let mut stego = Vec::new();
        let payload = Payload {
            extension: ".bin".to_string(),
            len: 10,
            reader: &b"short"[..],
        };

        assert!(matches!(
            encode(&mut cover.as_slice(), payload, &mut stego, |_| {}),
            Err(StegoError::FileAccess(_))
        ));
    }
}
