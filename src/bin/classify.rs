// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/classify.rs - 位图分类/检测推理程序
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

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shanan_classify::{
  args::{Args, TaskKind},
  input::decode_file,
  model::{Classifier, Detector, LabelTable},
  output::{OutputWrapper, Render},
  runtime::RknpuRuntimeBuilder,
  task::{RepeatShotTask, Task},
};

fn main() -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse_or_exit();

  info!("模型文件路径: {}", args.model.display());
  info!("标签文件路径: {}", args.labels.display());
  info!("输入图像: {}", args.image.display());
  info!("分数阈值: {}", args.threshold);

  let labels = LabelTable::load_non_empty(&args.labels)
    .with_context(|| format!("无法读取标签文件: {}", args.labels.display()))?;
  info!("读取 {} 个标签", labels.len());

  let image = decode_file(&args.image)
    .with_context(|| format!("无法读取图像文件: {}", args.image.display()))?;
  info!(
    "图像读取完成: 高度/宽度 = {} / {}, 通道数 = {}",
    image.height(),
    image.width(),
    image.channels()
  );

  let mut runtime = RknpuRuntimeBuilder::new(&args.model)
    .input_shape(args.input_shape)
    .accelerator(args.accelerator)
    .build()
    .with_context(|| format!("无法加载模型: {}", args.model.display()))?;

  let task = RepeatShotTask::new(args.loop_count);
  let mut output = OutputWrapper::new(args.format, std::io::stdout().lock());

  match args.task {
    TaskKind::Classify => {
      let model = Classifier::new(labels, args.threshold).top_k(args.top_k);
      let report = task.run_task(&image, &mut runtime, &model)?;
      output.render_result(&image, &report.result)?;
    }
    TaskKind::Detect => {
      let model = Detector::new(labels, args.threshold);
      let report = task.run_task(&image, &mut runtime, &model)?;
      output.render_result(&image, &report.result)?;
    }
  }

  Ok(())
}
