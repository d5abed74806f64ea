// 该文件是 Shanan （山南西风） 项目的一部分。
// src/runtime.rs - 推理运行时接口
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
use tracing::{debug, error};

use crate::{
  frame::{AsNhwcFrame, TensorShape},
  model::dequantize,
};

#[cfg(feature = "rknpu")]
mod rknpu;
#[cfg(feature = "rknpu")]
pub use self::rknpu::{RknpuError, RknpuRuntime, RknpuRuntimeBuilder};

/// 运行时返回的原始输出张量
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTensor {
  Float(Vec<f32>),
  /// 8 位量化输出
  Quantized {
    data: Vec<u8>,
    scale: f32,
    zero_point: i32,
  },
}

impl OutputTensor {
  pub fn len(&self) -> usize {
    match self {
      OutputTensor::Float(data) => data.len(),
      OutputTensor::Quantized { data, .. } => data.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// 浮点输出原样返回，量化输出按 `scale`/`zero_point` 反量化
  pub fn to_f32(&self) -> Vec<f32> {
    match self {
      OutputTensor::Float(data) => data.clone(),
      OutputTensor::Quantized {
        data,
        scale,
        zero_point,
      } => dequantize(data, *scale, *zero_point),
    }
  }
}

/// 外部推理运行时：加载模型、绑定输入、执行、读取输出
pub trait InferenceRuntime {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 模型期望的输入形状，未知时返回 `None`
  fn input_shape(&self) -> Option<TensorShape>;

  fn set_input(&mut self, data: &[u8]) -> Result<(), Self::Error>;

  fn run(&mut self) -> Result<(), Self::Error>;

  fn outputs(&self) -> Result<Vec<OutputTensor>, Self::Error>;
}

#[derive(Error, Debug)]
pub enum RuntimeError<E: std::error::Error + 'static> {
  #[error("输入张量形状与图像不匹配: 模型 {expected}, 图像 {actual}")]
  ShapeMismatch {
    expected: TensorShape,
    actual: TensorShape,
  },
  #[error("推理运行时错误: {0}")]
  Backend(#[source] E),
}

/// 校验形状后把帧数据拷贝到运行时输入
pub fn bind_input<R, F>(runtime: &mut R, frame: &F) -> Result<(), RuntimeError<R::Error>>
where
  R: InferenceRuntime,
  F: AsNhwcFrame,
{
  let actual = frame.shape();
  if let Some(expected) = runtime.input_shape() {
    debug!("模型输入形状: {}", expected);
    if expected != actual {
      error!("输入张量形状与图像不匹配: 模型 {}, 图像 {}", expected, actual);
      return Err(RuntimeError::ShapeMismatch { expected, actual });
    }
  }

  runtime
    .set_input(frame.as_nhwc())
    .map_err(RuntimeError::Backend)?;
  debug!("输入拷贝完成: {} 字节", frame.as_nhwc().len());
  Ok(())
}
