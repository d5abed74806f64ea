// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - 解码后图像帧定义
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

use std::{fmt, str::FromStr};

use thiserror::Error;

/// 以 NHWC 排布提供像素数据
pub trait AsNhwcFrame {
  fn as_nhwc(&self) -> &[u8];
  fn shape(&self) -> TensorShape;
}

/// NHWC 张量形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorShape {
  pub batch: usize,
  pub height: usize,
  pub width: usize,
  pub channels: usize,
}

impl TensorShape {
  pub fn nhwc(height: usize, width: usize, channels: usize) -> Self {
    Self {
      batch: 1,
      height,
      width,
      channels,
    }
  }

  pub fn len(&self) -> usize {
    self.batch * self.height * self.width * self.channels
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl fmt::Display for TensorShape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}x{}x{}x{}",
      self.batch, self.height, self.width, self.channels
    )
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("无效的形状描述 '{0}'，期望格式为 HxWxC")]
pub struct ParseShapeError(String);

/// 解析 `HxWxC` 形式的输入形状，批大小固定为 1
impl FromStr for TensorShape {
  type Err = ParseShapeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let dims = s
      .split(['x', 'X'])
      .map(|d| d.trim().parse::<usize>())
      .collect::<Result<Vec<_>, _>>()
      .map_err(|_| ParseShapeError(s.to_string()))?;

    match dims.as_slice() {
      [h, w, c] => Ok(TensorShape::nhwc(*h, *w, *c)),
      _ => Err(ParseShapeError(s.to_string())),
    }
  }
}

/// 位图解码结果
///
/// 像素按行优先、自上而下存放，三通道图像为 RGB 顺序。
/// 只能由解码器构造，构造后不可修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
  width: usize,
  height: usize,
  channels: usize,
  pixels: Box<[u8]>,
}

impl DecodedImage {
  pub(crate) fn new(width: usize, height: usize, channels: usize, pixels: Vec<u8>) -> Self {
    debug_assert_eq!(pixels.len(), width * height * channels);
    Self {
      width,
      height,
      channels,
      pixels: pixels.into_boxed_slice(),
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn channels(&self) -> usize {
    self.channels
  }

  pub fn pixels(&self) -> &[u8] {
    &self.pixels
  }

  pub fn into_pixels(self) -> Box<[u8]> {
    self.pixels
  }

  /// 第 `y` 行（自上而下）的像素字节
  pub fn row(&self, y: usize) -> Option<&[u8]> {
    let line = self.width * self.channels;
    self.pixels.get(y * line..(y + 1) * line)
  }
}

impl AsNhwcFrame for DecodedImage {
  fn as_nhwc(&self) -> &[u8] {
    &self.pixels
  }

  fn shape(&self) -> TensorShape {
    TensorShape::nhwc(self.height, self.width, self.channels)
  }
}
