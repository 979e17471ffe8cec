//! # 解码器
//!
//! 按编码时的字段顺序从像素字节的最低位读回数据流，逐字段校验。
//!
//! 解码分两步进行：[`Decoder::open`] 读到秘密数据长度为止，调用方可以据此
//! (例如根据扩展名) 决定输出位置；随后 [`Decoder::stream_payload`] 把秘密数据
//! 逐块写入输出，不在内存中整体缓存。

use crate::codec::{decode_byte, decode_u32};
use crate::constants::{BITS_PER_BYTE, BMP_HEADER_SIZE, MAGIC_MARKER, PAYLOAD_CHUNK};
use crate::error::{Result, StegoError};
use crate::layout::{BmpGeometry, Field};
use std::io::{Read, Write};

/// 解码状态机。每次转换都要求前一个字段已成功解码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Start,
    HeaderSkipped,
    MagicVerified,
    ExtLenRead,
    ExtRead,
    PayloadLenRead,
    PayloadStreamed,
    Done,
}

/// 调用方可选提供的期望值，用于交叉校验解码出的字段。
///
/// 默认全部为 `None`，即完全信任嵌入的字段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectations {
    pub extension: Option<String>,
    pub payload_len: Option<u32>,
}

/// 解码结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub extension: String,
    pub payload_len: u32,
}

/// 一次解码操作持有的游标状态。
struct DecodingSession<R> {
    stego: R,
    cursor: u64,
    available: u64,
    carrier: Vec<u8>,
}

impl<R: Read> DecodingSession<R> {
    /// 跳过头部，并从中取得像素数据区大小。
    fn open(mut stego: R) -> Result<Self> {
        let mut header = [0u8; BMP_HEADER_SIZE];
        stego.read_exact(&mut header)?;

        Ok(Self {
            stego,
            cursor: 0,
            available: BmpGeometry::from_header(&header).pixel_data_bytes(),
            carrier: Vec::new(),
        })
    }

    fn has_room(&self, field: Field, units: u64) -> bool {
        self.cursor + field.carrier_bytes(units) <= self.available
    }

    fn ensure_room(&self, field: Field, units: u64) -> Result<()> {
        if self.has_room(field, units) {
            return Ok(());
        }
        Err(StegoError::CorruptField {
            field,
            reason: format!(
                "declares {} bytes but only {} pixel bytes remain",
                units,
                self.available.saturating_sub(self.cursor)
            ),
        })
    }

    fn extract_bytes(&mut self, field: Field, count: usize) -> Result<Vec<u8>> {
        self.ensure_room(field, count as u64)?;
        self.read_bytes(count)
    }

    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.carrier.resize(count * BITS_PER_BYTE, 0);
        self.stego.read_exact(&mut self.carrier)?;
        self.cursor += self.carrier.len() as u64;

        self.carrier
            .chunks_exact(BITS_PER_BYTE)
            .map(decode_byte)
            .collect()
    }

    fn extract_length(&mut self, field: Field) -> Result<u32> {
        self.ensure_room(field, 1)?;
        self.carrier.resize(field.carrier_width(), 0);
        self.stego.read_exact(&mut self.carrier)?;
        self.cursor += self.carrier.len() as u64;
        decode_u32(&self.carrier)
    }

    fn stream_bytes<W: Write>(&mut self, len: u32, sink: &mut W) -> Result<()> {
        self.ensure_room(Field::Payload, u64::from(len))?;
        let mut remaining = len as usize;

        while remaining > 0 {
            let take = remaining.min(PAYLOAD_CHUNK);
            let chunk = self.read_bytes(take)?;
            sink.write_all(&chunk)?;
            remaining -= take;
        }

        sink.flush()?;
        Ok(())
    }
}

fn mismatch(field: Field, expected: impl ToString, found: impl ToString) -> StegoError {
    StegoError::FieldMismatch {
        field,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// 已读完元数据、等待输出秘密数据的解码器。
pub struct Decoder<R, F> {
    session: DecodingSession<R>,
    on_state: F,
    extension: String,
    payload_len: u32,
}

impl<R, F> Decoder<R, F>
where
    R: Read,
    F: FnMut(DecodeState),
{
    /// 依次跳过头部、校验签名、读取扩展名与秘密数据长度。
    ///
    /// 每进入一个新状态调用一次 `on_state`。
    ///
    /// # Errors
    ///
    /// * [`StegoError::MagicMismatch`] - 图像中没有可识别的数据流。
    /// * [`StegoError::FieldMismatch`] - 与 `expect` 中的期望值不一致。
    /// * [`StegoError::CorruptField`] - 声明的长度超出图像剩余容量，或扩展名不是合法 UTF-8。
    /// * [`StegoError::FileAccess`] - 读取失败或图像数据提前结束。
    pub fn open(stego: R, expect: &Expectations, mut on_state: F) -> Result<Self> {
        on_state(DecodeState::Start);
        let mut session = DecodingSession::open(stego)?;
        on_state(DecodeState::HeaderSkipped);

        if !session.has_room(Field::Magic, MAGIC_MARKER.len() as u64) {
            return Err(StegoError::MagicMismatch);
        }
        if session.read_bytes(MAGIC_MARKER.len())? != MAGIC_MARKER {
            return Err(StegoError::MagicMismatch);
        }
        on_state(DecodeState::MagicVerified);

        let extension_len = session.extract_length(Field::ExtensionLen)?;
        if let Some(expected) = &expect.extension
            && expected.len() as u64 != u64::from(extension_len)
        {
            return Err(mismatch(Field::ExtensionLen, expected.len(), extension_len));
        }
        on_state(DecodeState::ExtLenRead);

        let raw = session.extract_bytes(Field::Extension, extension_len as usize)?;
        let extension = String::from_utf8(raw).map_err(|e| StegoError::CorruptField {
            field: Field::Extension,
            reason: e.to_string(),
        })?;
        if let Some(expected) = &expect.extension
            && *expected != extension
        {
            return Err(mismatch(Field::Extension, expected, &extension));
        }
        on_state(DecodeState::ExtRead);

        let payload_len = session.extract_length(Field::PayloadLen)?;
        if let Some(expected) = expect.payload_len
            && expected != payload_len
        {
            return Err(mismatch(Field::PayloadLen, expected, payload_len));
        }
        session.ensure_room(Field::Payload, u64::from(payload_len))?;
        on_state(DecodeState::PayloadLenRead);

        Ok(Self {
            session,
            on_state,
            extension,
            payload_len,
        })
    }

    /// 解码出的扩展名 (含前导 `.`，可能为空)。
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// 解码出的秘密数据字节数。
    pub fn payload_len(&self) -> u32 {
        self.payload_len
    }

    /// 把秘密数据逐块解码并写入 `sink`。
    ///
    /// 失败时 `sink` 中可能已有部分数据，清理由调用方负责。
    pub fn stream_payload<W: Write>(mut self, sink: &mut W) -> Result<Decoded> {
        self.session.stream_bytes(self.payload_len, sink)?;
        (self.on_state)(DecodeState::PayloadStreamed);
        (self.on_state)(DecodeState::Done);

        Ok(Decoded {
            extension: self.extension,
            payload_len: self.payload_len,
        })
    }
}

/// 从 `stego` 中恢复秘密数据并写入 `sink`。
pub fn decode<R, W, F>(
    stego: R,
    sink: &mut W,
    expect: &Expectations,
    on_state: F,
) -> Result<Decoded>
where
    R: Read,
    W: Write,
    F: FnMut(DecodeState),
{
    Decoder::open(stego, expect, on_state)?.stream_payload(sink)
}
