//! # bmp_stego 库
//!
//! 本库包含 BMP LSB 隐写工具的核心逻辑：位编解码、数据流布局、
//! 容量规划以及编码器与解码器。命令行相关的代码位于 `cli` 与 `handler`。

// 声明库包含的所有模块。

pub mod capacity;
pub mod cli;
pub mod codec;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod handler;
pub mod layout;

pub use decoder::{DecodeState, Decoded, Decoder, Expectations, decode};
pub use encoder::{EncodeReport, Payload, encode};
pub use error::{Result, StegoError};
pub use layout::Field;
