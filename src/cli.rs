//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位 BMP 图像中隐藏或恢复任意文件。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位 BMP 图像中隐藏或恢复任意文件。"
)]
pub struct Cli {
    /// 输出更详细的日志 (-v 显示各阶段进度，-vv 显示调试信息)。
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：encode (隐藏) 和 decode (恢复)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 把秘密文件隐藏到 BMP 图像中。
    #[command(alias = "hide")]
    Encode(EncodeArgs),

    /// 从经过隐写的 BMP 图像中恢复秘密文件。
    #[command(alias = "recover")]
    Decode(DecodeArgs),
}

/// 'encode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// 用于隐写的输入 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的秘密文件路径，其扩展名会一并嵌入。
    #[arg(short, long)]
    pub secret: PathBuf,

    /// 输出 BMP 图像路径，默认为输入图像旁的 `stego_<文件名>`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'decode' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// 已隐藏数据的 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复出的秘密文件路径，默认为图像旁的 `decoded<扩展名>`。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 要求嵌入的扩展名与此值一致 (如 `.txt`)。
    #[arg(long)]
    pub expect_ext: Option<String>,

    /// 要求嵌入的秘密数据长度与此值一致。
    #[arg(long)]
    pub expect_len: Option<u32>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}
