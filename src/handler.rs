//! # 命令处理逻辑模块
//!
//! 包含处理 `encode` 和 `decode` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心编解码流程以及向用户报告结果。

use crate::cli::{DecodeArgs, EncodeArgs};
use crate::decoder::{DecodeState, Decoder, Expectations};
use crate::encoder::{Payload, encode};
use crate::error::StegoError;
use anyhow::{Context, Result};
use colored::Colorize;
use image::ImageFormat;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 确认路径带有 `.bmp` 后缀。
pub fn require_bmp(path: &Path) -> Result<(), StegoError> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Bmp) => Ok(()),
        _ => Err(StegoError::InvalidInputFormat(format!(
            "{} is not a .bmp file",
            path.display()
        ))),
    }
}

/// 秘密文件名中第一个 `.` 起的后缀，例如 `notes.tar.gz` 得到 `.tar.gz`。
///
/// 没有后缀 (或只是以 `.` 开头的隐藏文件) 时返回空字符串。
pub fn payload_extension(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    name.char_indices()
        .skip(1)
        .find(|&(_, c)| c == '.')
        .map(|(i, _)| name[i..].to_string())
        .unwrap_or_default()
}

/// 默认的隐写输出路径：与输入图像同目录的 `stego_<文件名>`。
pub fn default_stego_path(image: &Path) -> PathBuf {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.bmp".to_string());
    image.with_file_name(format!("stego_{name}"))
}

/// 默认的恢复输出路径：与隐写图像同目录的 `decoded<扩展名>`。
pub fn default_output_path(image: &Path, extension: &str) -> PathBuf {
    image.with_file_name(format!("decoded{extension}"))
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {} \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 两个路径解析后是否指向同一个文件 (处理 `..` 与符号链接)。
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// 在 `dest` 所在目录创建临时文件。成功后用 `persist` 替换 `dest`，
/// 失败时临时文件随 drop 删除，`dest` 保持原样。
fn stage_output(dest: &Path) -> Result<NamedTempFile> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir).with_context(|| {
        format!(
            "Unable to create a temporary file beside: {}",
            dest.to_string_lossy().red().bold()
        )
    })
}

fn commit_output(staged: NamedTempFile, dest: &Path) -> Result<()> {
    staged.persist(dest).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;
    Ok(())
}

/// 处理 'Encode' 命令的执行逻辑。
///
/// 负责打开图像、秘密文件和输出文件，调用编码器按字段写入数据流，
/// 最后报告结果。输出先写入同目录的临时文件，编码成功后才替换目标文件，
/// 因此失败时已存在的目标文件保持不变。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输入或输出图像不是 `.bmp` 文件。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取输入的图像或秘密文件。
/// * 图像没有足够的空间来隐藏秘密文件。
/// * 无法写入到目标图像文件。
pub fn handle_encode(args: EncodeArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_stego_path(&args.image));

    require_bmp(&args.image).context("Source image must be a BMP file")?;
    require_bmp(&dest).context("Output image must be a BMP file")?;
    anyhow::ensure!(
        dest != args.image && !same_file(&dest, &args.image),
        "Output image must differ from the source image: {}",
        dest.to_string_lossy().red().bold()
    );
    ensure_writable(&dest, args.force)?;

    let cover = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let secret = File::open(&args.secret).with_context(|| {
        format!(
            "Unable to read secret file: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;
    let secret_len = secret.metadata()?.len();

    let payload = Payload {
        extension: payload_extension(&args.secret),
        len: secret_len,
        reader: BufReader::new(secret),
    };
    debug!(
        "embedding {} bytes with extension {:?}",
        payload.len, payload.extension
    );

    let mut staged = stage_output(&dest)?;
    let mut cover = BufReader::new(cover);

    let report = encode(
        &mut cover,
        payload,
        &mut BufWriter::new(staged.as_file_mut()),
        |field| info!("encoded {field}"),
    )
    .with_context(|| {
        format!(
            "Failed to hide {} in {}",
            args.secret.to_string_lossy().red().bold(),
            args.image.to_string_lossy().red().bold()
        )
    })?;

    commit_output(staged, &dest)?;

    debug!(
        "used {} of {} pixel bytes, copied {} tail bytes",
        report.bits_embedded, report.available, report.tail_bytes
    );

    println!(
        "The secret file has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 先读出扩展名和长度以确定输出路径，再把秘密数据流式写入该文件。
/// 图像中没有隐写数据时不会创建任何输出文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `DecodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输入图像不是 `.bmp` 文件，或无法读取。
/// * 图像中没有可识别的隐写数据，或字段与 `--expect-*` 不一致。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法写入到目标文件。
pub fn handle_decode(args: DecodeArgs) -> Result<()> {
    require_bmp(&args.image).context("Stego image must be a BMP file")?;

    let stego = File::open(&args.image).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let expect = Expectations {
        extension: args.expect_ext.clone(),
        payload_len: args.expect_len,
    };

    let on_state = |state: DecodeState| info!("decode reached {state:?}");
    let decoder = Decoder::open(BufReader::new(stego), &expect, on_state).with_context(|| {
        format!(
            "Failed to recover hidden data from '{}'. \nThe image may not contain a hidden file or is corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.image, decoder.extension()));
    ensure_writable(&output, args.force)?;

    let mut staged = stage_output(&output)?;

    let decoded = decoder
        .stream_payload(&mut BufWriter::new(staged.as_file_mut()))
        .with_context(|| {
            format!(
                "Failed to recover the hidden file from '{}'.",
                args.image.to_string_lossy().red().bold()
            )
        })?;

    commit_output(staged, &output)?;

    debug!(
        "recovered {} bytes with extension {:?}",
        decoded.payload_len, decoded.extension
    );

    println!(
        "The secret file has been successfully recovered and saved: {}",
        output.to_string_lossy().green().bold()
    );
    Ok(())
}
