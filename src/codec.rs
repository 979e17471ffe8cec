//! # 位编解码器
//!
//! 把一个字节或 `u32` 按最高位优先的顺序写入 (或读出) 连续载体字节的最低位。
//! 每个载体字节只有 bit 0 会被改写，其余 7 位保持不变。

use crate::constants::{BITS_PER_BYTE, BITS_PER_LENGTH};
use crate::error::{Result, StegoError};

fn carrier_prefix(carrier: &[u8], width: usize) -> Result<&[u8]> {
    carrier.get(..width).ok_or(StegoError::BufferTooShort {
        needed: width,
        got: carrier.len(),
    })
}

fn embed_bits(value: u32, carrier: &mut [u8], width: usize) -> Result<()> {
    let got = carrier.len();
    let sub_pix = carrier
        .get_mut(..width)
        .ok_or(StegoError::BufferTooShort { needed: width, got })?;

    for (i, byte) in sub_pix.iter_mut().enumerate() {
        let bit = ((value >> (width - 1 - i)) & 1) as u8;
        *byte = (*byte & 0xFE) | bit;
    }

    Ok(())
}

fn extract_bits(carrier: &[u8], width: usize) -> Result<u32> {
    let sub_pix = carrier_prefix(carrier, width)?;

    Ok(sub_pix
        .iter()
        .fold(0u32, |acc, &byte| (acc << 1) | u32::from(byte & 1)))
}

/// 把 `value` 写入 `carrier` 前 8 个字节的最低位，bit 7 写入 `carrier[0]`。
pub fn encode_byte(value: u8, carrier: &mut [u8]) -> Result<()> {
    embed_bits(u32::from(value), carrier, BITS_PER_BYTE)
}

/// 从 `carrier` 前 8 个字节的最低位重建一个字节。
pub fn decode_byte(carrier: &[u8]) -> Result<u8> {
    extract_bits(carrier, BITS_PER_BYTE).map(|v| v as u8)
}

/// 把 `value` 写入 `carrier` 前 32 个字节的最低位，最高位优先。
pub fn encode_u32(value: u32, carrier: &mut [u8]) -> Result<()> {
    embed_bits(value, carrier, BITS_PER_LENGTH)
}

/// 从 `carrier` 前 32 个字节的最低位重建一个 `u32`。
pub fn decode_u32(carrier: &[u8]) -> Result<u32> {
    extract_bits(carrier, BITS_PER_LENGTH)
}
