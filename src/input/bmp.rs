// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/bmp.rs - 非压缩位图解码
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  io::{Cursor, Read, Seek, SeekFrom},
  path::Path,
};

use thiserror::Error;
use tracing::debug;

use crate::frame::DecodedImage;

pub const BMP_FILE_HEADER_SIZE: usize = 14;
pub const BMP_INFO_HEADER_SIZE: usize = 40;
pub const BMP_HEADER_SIZE: usize = BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE;

const BMP_MAGIC: [u8; 2] = *b"BM";
const BI_RGB: u32 = 0;

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("位图数据不足")]
  ShortRead,
  #[error("位图标记无效: {0:02X?}")]
  BadMagic([u8; 2]),
  #[error("不支持的通道数: {0}")]
  UnsupportedChannelCount(u16),
  #[error("不支持的压缩方式: {0}")]
  UnsupportedCompression(u32),
  #[error("无法跳过位图数据")]
  SeekFailed,
  #[error("无效的图像宽度: {0}")]
  InvalidWidth(i32),
  #[error("I/O 错误: {0}")]
  Io(std::io::Error),
}

/// 54 字节的文件头与信息头
#[derive(Debug, Clone)]
pub struct BmpHeader {
  bytes: [u8; BMP_HEADER_SIZE],
}

impl BmpHeader {
  pub fn new(bytes: [u8; BMP_HEADER_SIZE]) -> Self {
    Self { bytes }
  }

  fn field<const N: usize>(&self, offset: usize) -> [u8; N] {
    std::array::from_fn(|i| self.bytes[offset + i])
  }

  pub fn magic(&self) -> [u8; 2] {
    self.field(0)
  }

  /// 像素数据相对文件起始的偏移
  pub fn pixel_offset(&self) -> u32 {
    u32::from_le_bytes(self.field(10))
  }

  pub fn width(&self) -> i32 {
    i32::from_le_bytes(self.field(18))
  }

  /// 负值表示自上而下存储
  pub fn height(&self) -> i32 {
    i32::from_le_bytes(self.field(22))
  }

  pub fn bits_per_pixel(&self) -> u16 {
    u16::from_le_bytes(self.field(28))
  }

  pub fn compression(&self) -> u32 {
    u32::from_le_bytes(self.field(30))
  }
}

/// 每行有效像素字节数
pub fn line_bytes(width: usize, channels: usize) -> usize {
  width * channels
}

/// 每行补齐到 4 字节边界所需的填充字节数
pub fn row_padding(width: usize, channels: usize) -> usize {
  let bits = 8 * channels as u64 * width as u64;
  let padded = 4 * bits.div_ceil(32);
  (padded - line_bytes(width, channels) as u64) as usize
}

/// 校验后的行字节数与像素总字节数，乘法溢出时返回 `None`
fn frame_len(width: usize, height: usize, channels: usize) -> Option<(usize, usize)> {
  let line = width.checked_mul(channels)?;
  Some((line, line.checked_mul(height)?))
}

/// 自行记录读取位置的字节源，跳转越过流末尾视为失败
struct ByteSource<R> {
  inner: R,
  pos: u64,
  end: Option<u64>,
}

impl<R: Read + Seek> ByteSource<R> {
  fn new(inner: R) -> Self {
    Self {
      inner,
      pos: 0,
      end: None,
    }
  }

  fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
    self
      .inner
      .read_exact(buf)
      .map_err(|_| DecodeError::ShortRead)?;
    self.pos += buf.len() as u64;
    Ok(())
  }

  /// 读取 `n` 字节追加到 `buf`，缓冲区只随实际读到的数据增长
  fn read_append(&mut self, buf: &mut Vec<u8>, n: usize) -> Result<(), DecodeError> {
    let got = (&mut self.inner)
      .take(n as u64)
      .read_to_end(buf)
      .map_err(|_| DecodeError::ShortRead)?;
    self.pos += got as u64;
    if got < n {
      return Err(DecodeError::ShortRead);
    }
    Ok(())
  }

  /// 流末尾相对起始位置的偏移，首次调用时测量
  fn end(&mut self) -> Result<u64, DecodeError> {
    if let Some(end) = self.end {
      return Ok(end);
    }
    let here = self
      .inner
      .stream_position()
      .map_err(|_| DecodeError::SeekFailed)?;
    let last = self
      .inner
      .seek(SeekFrom::End(0))
      .map_err(|_| DecodeError::SeekFailed)?;
    self
      .inner
      .seek(SeekFrom::Start(here))
      .map_err(|_| DecodeError::SeekFailed)?;
    let end = self.pos + last.saturating_sub(here);
    self.end = Some(end);
    Ok(end)
  }

  fn skip(&mut self, n: u64) -> Result<(), DecodeError> {
    if n == 0 {
      return Ok(());
    }
    let end = self.end()?;
    let target = self
      .pos
      .checked_add(n)
      .filter(|target| *target <= end)
      .ok_or(DecodeError::SeekFailed)?;
    let step = i64::try_from(n).map_err(|_| DecodeError::SeekFailed)?;
    self
      .inner
      .seek(SeekFrom::Current(step))
      .map_err(|_| DecodeError::SeekFailed)?;
    self.pos = target;
    Ok(())
  }
}

/// 从字节流解码位图
///
/// 只支持 8 位灰度与 24 位 RGB 的非压缩格式。任何一步校验失败都会立即返回错误，
/// 不会产生部分结果。
pub fn decode<R: Read + Seek>(reader: R) -> Result<DecodedImage, DecodeError> {
  let mut source = ByteSource::new(reader);

  let mut bytes = [0u8; BMP_HEADER_SIZE];
  source.read_exact(&mut bytes)?;
  let header = BmpHeader::new(bytes);

  let magic = header.magic();
  if magic != BMP_MAGIC {
    return Err(DecodeError::BadMagic(magic));
  }

  let channels = header.bits_per_pixel() / 8;
  if channels != 1 && channels != 3 {
    return Err(DecodeError::UnsupportedChannelCount(channels));
  }

  let compression = header.compression();
  if compression != BI_RGB {
    return Err(DecodeError::UnsupportedCompression(compression));
  }

  let offset = u64::from(header.pixel_offset());
  if offset > BMP_HEADER_SIZE as u64 {
    source.skip(offset - BMP_HEADER_SIZE as u64)?;
  }

  let raw_width = header.width();
  if raw_width < 0 {
    return Err(DecodeError::InvalidWidth(raw_width));
  }
  let width = raw_width as usize;

  let raw_height = header.height();
  let top_down = raw_height < 0;
  let height = raw_height.unsigned_abs() as usize;

  let channels = usize::from(channels);
  let (line, _) =
    frame_len(width, height, channels).ok_or(DecodeError::InvalidWidth(raw_width))?;
  let padding = row_padding(width, channels);

  debug!(
    "位图信息: 宽度 = {}, 高度 = {}, 通道数 = {}, 行字节 = {}, 填充 = {}, 自上而下 = {}",
    width, height, channels, line, padding, top_down
  );

  let mut pixels = Vec::new();
  for _ in 0..height {
    let start = pixels.len();
    source.read_append(&mut pixels, line)?;
    source.skip(padding as u64)?;
    if channels == 3 {
      for pixel in pixels[start..].chunks_exact_mut(3) {
        pixel.swap(0, 2);
      }
    }
  }

  if !top_down && line > 0 {
    let mut flipped = Vec::with_capacity(pixels.len());
    for row in pixels.rchunks_exact(line) {
      flipped.extend_from_slice(row);
    }
    pixels = flipped;
  }

  Ok(DecodedImage::new(width, height, channels, pixels))
}

pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
  decode(Cursor::new(bytes))
}

/// 整个文件读入内存后解码，行间填充的跳转只移动游标
pub fn decode_file(path: impl AsRef<Path>) -> Result<DecodedImage, DecodeError> {
  let bytes = std::fs::read(path.as_ref()).map_err(DecodeError::Io)?;
  decode_bytes(&bytes)
}
