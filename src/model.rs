// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 模型输出后处理
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

use thiserror::Error;

use crate::{frame::DecodedImage, runtime::OutputTensor};

pub mod label;
pub mod ranker;

mod classify;
mod detect;

pub use self::classify::{Classification, ClassifyResult, Classifier};
pub use self::detect::{DetectItem, DetectResult, Detector, PixelBox};
pub use self::label::{LabelError, LabelTable};
pub use self::ranker::{RankedResult, dequantize, rank, top_k};

#[derive(Error, Debug, PartialEq)]
pub enum PostprocessError {
  #[error("缺少第 {0} 个模型输出")]
  MissingOutput(usize),
  #[error("第 {output} 个输出长度不足: 需要 {expected}, 实际 {actual}")]
  Truncated {
    output: usize,
    expected: usize,
    actual: usize,
  },
}

/// 把推理运行时的原始输出转换为带标签的结果
pub trait Model {
  type Output;

  fn postprocess(
    &self,
    frame: &DecodedImage,
    outputs: &[OutputTensor],
  ) -> Result<Self::Output, PostprocessError>;
}

fn output_f32(outputs: &[OutputTensor], index: usize) -> Result<Vec<f32>, PostprocessError> {
  outputs
    .get(index)
    .map(OutputTensor::to_f32)
    .ok_or(PostprocessError::MissingOutput(index))
}
