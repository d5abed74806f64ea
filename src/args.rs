// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 命令行参数
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

use clap::{ArgAction, Parser, ValueEnum, builder::BoolishValueParser, error::ErrorKind};

use crate::{frame::TensorShape, output::OutputFormat};

/// 参数校验失败时的退出码
pub const USAGE_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskKind {
  /// 单输出分类模型
  Classify,
  /// SSD 检测模型（框、类别、分数、数量四个输出）
  Detect,
}

/// Shanan 位图推理参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// RKNN 模型文件路径
  #[arg(value_name = "MODEL")]
  pub model: PathBuf,
  /// 标签文件路径，每行一个标签
  #[arg(value_name = "LABELS")]
  pub labels: PathBuf,
  /// 输入位图路径
  #[arg(value_name = "IMAGE")]
  pub image: PathBuf,
  /// 分数阈值（包含）
  #[arg(value_name = "THRESHOLD", allow_hyphen_values = true)]
  pub threshold: f32,
  /// 是否启用加速器（1/0、true/false）
  #[arg(
    value_name = "ACCELERATOR",
    action = ArgAction::Set,
    value_parser = BoolishValueParser::new()
  )]
  pub accelerator: bool,
  /// 推理重复次数，非正数按 1 次处理
  #[arg(value_name = "LOOP_COUNT", allow_hyphen_values = true)]
  pub loop_count: i64,
  /// 模型输出类型
  #[arg(long, value_enum, default_value_t = TaskKind::Classify)]
  pub task: TaskKind,
  /// 最多输出的分类结果数量
  #[arg(long, value_name = "K")]
  pub top_k: Option<usize>,
  /// 输出格式
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  pub format: OutputFormat,
  /// 模型期望的输入形状 HxWxC，用于校验图像
  #[arg(long, value_name = "SHAPE")]
  pub input_shape: Option<TensorShape>,
}

impl Args {
  /// 解析进程参数，帮助与版本信息照常输出，其余错误以 [`USAGE_EXIT_CODE`] 退出
  pub fn parse_or_exit() -> Self {
    match Self::try_parse() {
      Ok(args) => args,
      Err(e) => match exit_code(&e) {
        0 => e.exit(),
        code => {
          let _ = e.print();
          std::process::exit(code)
        }
      },
    }
  }
}

/// clap 错误对应的进程退出码
pub fn exit_code(err: &clap::Error) -> i32 {
  match err.kind() {
    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
    _ => USAGE_EXIT_CODE,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const POSITIONALS: [&str; 7] = [
    "classify",
    "model.rknn",
    "labels.txt",
    "image.bmp",
    "0.5",
    "1",
    "10",
  ];

  #[test]
  fn full_arguments_parse() {
    let args = Args::try_parse_from(POSITIONALS).unwrap();
    assert_eq!(args.image, PathBuf::from("image.bmp"));
    assert_eq!(args.threshold, 0.5);
    assert!(args.accelerator);
    assert_eq!(args.loop_count, 10);
    assert_eq!(args.task, TaskKind::Classify);
    assert_eq!(args.format, OutputFormat::Text);
    assert!(args.input_shape.is_none());
  }

  #[test]
  fn hyphen_values_and_options() {
    let args = Args::try_parse_from([
      "classify",
      "m",
      "l",
      "i",
      "-0.25",
      "false",
      "-3",
      "--task",
      "detect",
      "--input-shape",
      "224x224x3",
    ])
    .unwrap();
    assert_eq!(args.threshold, -0.25);
    assert!(!args.accelerator);
    assert_eq!(args.loop_count, -3);
    assert_eq!(args.task, TaskKind::Detect);
    assert_eq!(args.input_shape, Some(TensorShape::nhwc(224, 224, 3)));
  }

  #[test]
  fn missing_positional_exits_with_one() {
    let err = Args::try_parse_from(POSITIONALS[..6].iter().copied()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert_eq!(exit_code(&err), 1);
  }

  #[test]
  fn invalid_values_exit_with_one() {
    let mut argv = POSITIONALS;
    argv[4] = "high";
    let err = Args::try_parse_from(argv).unwrap_err();
    assert_eq!(exit_code(&err), 1);

    let mut argv = POSITIONALS;
    argv[5] = "maybe";
    let err = Args::try_parse_from(argv).unwrap_err();
    assert_eq!(exit_code(&err), 1);
  }

  #[test]
  fn help_keeps_success_code() {
    let err = Args::try_parse_from(["classify", "--help"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    assert_eq!(exit_code(&err), 0);
  }
}
