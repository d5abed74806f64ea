// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 推理任务
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

use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{info, warn};

use crate::{
  frame::DecodedImage,
  model::Model,
  runtime::{InferenceRuntime, bind_input},
};

pub trait Task<R, M>: Sized {
  type Output;
  type Error;
  fn run_task(
    self,
    frame: &DecodedImage,
    runtime: &mut R,
    model: &M,
  ) -> Result<Self::Output, Self::Error>;
}

/// 任务结果与每次推理的耗时
#[derive(Debug, Clone)]
pub struct TaskReport<T> {
  pub result: T,
  pub timings: Vec<Duration>,
}

impl<T> TaskReport<T> {
  pub fn first(&self) -> Option<Duration> {
    self.timings.first().copied()
  }

  pub fn mean(&self) -> Option<Duration> {
    let count = u32::try_from(self.timings.len()).ok().filter(|n| *n > 0)?;
    Some(self.timings.iter().sum::<Duration>() / count)
  }
}

/// 绑定一次输入后重复推理 `loop_count` 次，只对最后一次输出做后处理
#[derive(Debug, Clone, Copy)]
pub struct RepeatShotTask {
  loop_count: usize,
}

impl RepeatShotTask {
  /// 非正数按 1 次处理
  pub fn new(loop_count: i64) -> Self {
    Self {
      loop_count: usize::try_from(loop_count).unwrap_or(0).max(1),
    }
  }

  pub fn loop_count(&self) -> usize {
    self.loop_count
  }
}

pub struct OneShotTask;

impl<R, M> Task<R, M> for OneShotTask
where
  R: InferenceRuntime,
  M: Model,
{
  type Output = TaskReport<M::Output>;
  type Error = anyhow::Error;

  fn run_task(
    self,
    frame: &DecodedImage,
    runtime: &mut R,
    model: &M,
  ) -> Result<Self::Output, Self::Error> {
    RepeatShotTask::new(1).run_task(frame, runtime, model)
  }
}

impl<R, M> Task<R, M> for RepeatShotTask
where
  R: InferenceRuntime,
  M: Model,
{
  type Output = TaskReport<M::Output>;
  type Error = anyhow::Error;

  fn run_task(
    self,
    frame: &DecodedImage,
    runtime: &mut R,
    model: &M,
  ) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    bind_input(runtime, frame).context("无法设置模型输入")?;
    info!("输入拷贝完成，开始推理...");

    let mut timings = Vec::with_capacity(self.loop_count);
    for i in 0..self.loop_count {
      let now = Instant::now();
      runtime.run().context("推理执行失败")?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      timings.push(elapsed);
    }

    let outputs = runtime.outputs().context("无法读取模型输出")?;
    let result = model
      .postprocess(frame, &outputs)
      .context("模型输出后处理失败")?;

    let report = TaskReport { result, timings };
    if let (Some(first), Some(mean)) = (report.first(), report.mean()) {
      warn!(
        "推理 {} 次，首次耗时: {:.2?}，平均耗时: {:.2?}",
        self.loop_count, first, mean
      );
    }
    Ok(report)
  }
}
