//! # 错误类型
//!
//! 核心编解码流程使用的错误类型。所有核心操作返回 [`Result<T>`]，
//! 命令行层再用 `anyhow` 附加上下文。

use crate::layout::Field;
use thiserror::Error;

/// 隐写核心的错误类型。
#[derive(Error, Debug)]
pub enum StegoError {
    /// 文件后缀与所需的容器类型不符。
    #[error("Invalid input format: {0}")]
    InvalidInputFormat(String),

    /// 读写调用方提供的流时失败 (包括图像数据提前结束)。
    #[error("File access error")]
    FileAccess(#[from] std::io::Error),

    /// 图像像素数据不足以容纳全部字段。
    #[error("Not enough space in the image: required {required} bits, available {available}")]
    InsufficientCapacity { required: u64, available: u64 },

    /// 图像中没有可识别的隐写数据流。
    #[error("Magic marker mismatch: the image does not carry a hidden payload")]
    MagicMismatch,

    /// 解码出的字段与调用方期望的值不一致。
    #[error("Field mismatch in {field}: expected {expected}, found {found}")]
    FieldMismatch {
        field: Field,
        expected: String,
        found: String,
    },

    /// 解码出的字段本身不合法。
    #[error("Corrupt {field} field: {reason}")]
    CorruptField { field: Field, reason: String },

    /// 字段长度超出 32 位长度字段的表示范围。
    #[error("{field} is too long to embed ({len} bytes)")]
    LengthOverflow { field: Field, len: u64 },

    /// 提供给位编解码器的载体缓冲区过短。
    #[error("Carrier buffer too short: needed {needed} bytes, got {got}")]
    BufferTooShort { needed: usize, got: usize },
}

/// 核心操作的结果类型。
pub type Result<T> = std::result::Result<T, StegoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, ErrorKind};

    #[test]
    fn io_cause_is_reported_once_in_the_chain() {
        let err = anyhow::Error::from(StegoError::from(io::Error::new(
            ErrorKind::UnexpectedEof,
            "failed to fill whole buffer",
        )));

        assert_eq!(
            format!("{err:#}"),
            "File access error: failed to fill whole buffer"
        );
    }
}
