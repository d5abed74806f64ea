// 该文件是 Shanan （山南西风） 项目的一部分。
// src/runtime/rknpu.rs - RKNPU 推理后端
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

use std::path::PathBuf;

use rknpu::{Context, InitFlags, TensorFormat, TensorType};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  frame::TensorShape,
  runtime::{InferenceRuntime, OutputTensor},
};

/// 位图只提供一个 NHWC 输入
const EXPECTED_INPUTS: u32 = 1;

#[derive(Error, Debug)]
pub enum RknpuError {
  #[error("无法读取模型文件: {0}")]
  ReadModel(#[from] std::io::Error),
  #[error("无法查询{what}: {err}")]
  Query {
    what: &'static str,
    err: rknpu::Error,
  },
  #[error("模型需要 {0} 个输入，位图只能提供 1 个")]
  InputCount(u32),
  #[error("RKNN 调用失败: {0}")]
  Backend(rknpu::Error),
}

impl From<rknpu::Error> for RknpuError {
  fn from(err: rknpu::Error) -> Self {
    RknpuError::Backend(err)
  }
}

fn query<T>(what: &'static str, value: Result<T, rknpu::Error>) -> Result<T, RknpuError> {
  value.map_err(|err| {
    error!("查询{}失败: {}", what, err);
    RknpuError::Query { what, err }
  })
}

/// 记录上下文的版本信息并校验输入输出数量，返回输出数量
fn inspect(context: &Context) -> Result<usize, RknpuError> {
  let version = query("SDK 版本", context.sdk_version())?;
  match (version.api_version(), version.driver_version()) {
    (Ok(api), Ok(driver)) => info!("RKNN API {} / 驱动 {}", api, driver),
    _ => debug!("RKNN 版本字符串不可用"),
  }

  let inputs = query("输入数量", context.num_inputs())?;
  if inputs != EXPECTED_INPUTS {
    error!("模型输入数量为 {}", inputs);
    return Err(RknpuError::InputCount(inputs));
  }
  let outputs = query("输出数量", context.num_outputs())?;
  debug!("模型输入/输出数量: {} / {}", inputs, outputs);
  Ok(outputs as usize)
}

pub struct RknpuRuntimeBuilder {
  model_path: PathBuf,
  flags: InitFlags,
  input_shape: Option<TensorShape>,
  accelerator: bool,
}

impl RknpuRuntimeBuilder {
  pub fn new(model_path: impl Into<PathBuf>) -> Self {
    Self {
      model_path: model_path.into(),
      flags: InitFlags::default(),
      input_shape: None,
      accelerator: true,
    }
  }

  pub fn flags(mut self, flags: InitFlags) -> Self {
    self.flags = flags;
    self
  }

  /// 模型期望的输入形状，用于绑定输入前的校验
  pub fn input_shape(mut self, shape: Option<TensorShape>) -> Self {
    self.input_shape = shape;
    self
  }

  pub fn accelerator(mut self, enable: bool) -> Self {
    self.accelerator = enable;
    self
  }

  pub fn build(self) -> Result<RknpuRuntime, RknpuError> {
    if !self.accelerator {
      warn!("RKNPU 后端总是在 NPU 上执行，忽略关闭加速器的请求");
    }

    let model = std::fs::read(&self.model_path)?;
    info!(
      "读取模型 {} ({} 字节)",
      self.model_path.display(),
      model.len()
    );
    let context = Context::new(&model, self.flags)?;
    let num_outputs = inspect(&context)?;

    Ok(RknpuRuntime {
      context,
      num_outputs,
      input_shape: self.input_shape,
    })
  }
}

pub struct RknpuRuntime {
  context: Context,
  num_outputs: usize,
  input_shape: Option<TensorShape>,
}

impl InferenceRuntime for RknpuRuntime {
  type Error = RknpuError;

  fn input_shape(&self) -> Option<TensorShape> {
    self.input_shape
  }

  fn set_input(&mut self, data: &[u8]) -> Result<(), Self::Error> {
    debug!("设置模型输入");
    self
      .context
      .set_input(0, data, TensorFormat::NHWC, TensorType::UInt8)?;
    Ok(())
  }

  fn run(&mut self) -> Result<(), Self::Error> {
    debug!("执行模型推理");
    self.context.run()?;
    Ok(())
  }

  fn outputs(&self) -> Result<Vec<OutputTensor>, Self::Error> {
    debug!("获取模型输出");
    let output = self.context.get_outputs()?;

    let mut tensors = Vec::with_capacity(self.num_outputs);
    for index in 0..self.num_outputs {
      let data = output.get_f32(index).map_err(|e| {
        error!("获取第 {} 个输出失败: {}", index, e);
        RknpuError::from(e)
      })?;
      tensors.push(OutputTensor::Float(data.to_vec()));
    }
    Ok(tensors)
  }
}
