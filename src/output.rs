// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 结果输出
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

use std::io::Write;

use serde_json::{Value, json};
use thiserror::Error;

use crate::{
  frame::DecodedImage,
  model::{ClassifyResult, DetectResult},
};

pub trait Render<Output> {
  type Error;
  fn render_result(&mut self, frame: &DecodedImage, result: &Output) -> Result<(), Self::Error>;
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
  /// 可读文本
  #[default]
  Text,
  /// 每行一条记录：标签, 分数[, y, x, h, w]
  Record,
  /// JSON 文档
  Json,
}

/// 分类结果每行 `分数 标签`，检测结果沿用逐项的键值格式
pub struct TextOutput<W> {
  writer: W,
}

impl<W: Write> TextOutput<W> {
  pub fn new(writer: W) -> Self {
    Self { writer }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }
}

impl<W: Write> Render<ClassifyResult> for TextOutput<W> {
  type Error = OutputError;

  fn render_result(
    &mut self,
    _frame: &DecodedImage,
    result: &ClassifyResult,
  ) -> Result<(), Self::Error> {
    for item in result.items.iter() {
      // 分数固定 7 位宽，与标签以一个空格分隔
      writeln!(self.writer, "{:>7.5} {}", item.score, item.label)?;
    }
    self.writer.flush()?;
    Ok(())
  }
}

impl<W: Write> Render<DetectResult> for TextOutput<W> {
  type Error = OutputError;

  fn render_result(
    &mut self,
    _frame: &DecodedImage,
    result: &DetectResult,
  ) -> Result<(), Self::Error> {
    for item in result.items.iter() {
      let i = item.index;
      let r = item.rect;
      writeln!(
        self.writer,
        "classes({i}): {}, label({i}): {}, scores({i}): {} y,x,h,w = [{},{},{},{}]",
        item.class_id, item.label, item.score, r.y, r.x, r.h, r.w
      )?;
    }
    self.writer.flush()?;
    Ok(())
  }
}

pub struct RecordOutput<W> {
  writer: W,
}

impl<W: Write> RecordOutput<W> {
  pub fn new(writer: W) -> Self {
    Self { writer }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }
}

impl<W: Write> Render<ClassifyResult> for RecordOutput<W> {
  type Error = OutputError;

  fn render_result(
    &mut self,
    _frame: &DecodedImage,
    result: &ClassifyResult,
  ) -> Result<(), Self::Error> {
    for item in result.items.iter() {
      writeln!(self.writer, "{}, {:.4}", item.label, item.score)?;
    }
    self.writer.flush()?;
    Ok(())
  }
}

impl<W: Write> Render<DetectResult> for RecordOutput<W> {
  type Error = OutputError;

  fn render_result(
    &mut self,
    _frame: &DecodedImage,
    result: &DetectResult,
  ) -> Result<(), Self::Error> {
    for item in result.items.iter() {
      let r = item.rect;
      writeln!(
        self.writer,
        "{}, {:.4}, {}, {}, {}, {}",
        item.label, item.score, r.y, r.x, r.h, r.w
      )?;
    }
    self.writer.flush()?;
    Ok(())
  }
}

pub struct JsonOutput<W> {
  writer: W,
}

impl<W: Write> JsonOutput<W> {
  pub fn new(writer: W) -> Self {
    Self { writer }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }

  fn write_document(
    &mut self,
    frame: &DecodedImage,
    task: &str,
    results: Vec<Value>,
  ) -> Result<(), OutputError> {
    let document = json!({
      "task": task,
      "image": {
        "width": frame.width(),
        "height": frame.height(),
        "channels": frame.channels(),
      },
      "results": results,
    });
    serde_json::to_writer_pretty(&mut self.writer, &document)?;
    writeln!(self.writer)?;
    self.writer.flush()?;
    Ok(())
  }
}

impl<W: Write> Render<ClassifyResult> for JsonOutput<W> {
  type Error = OutputError;

  fn render_result(
    &mut self,
    frame: &DecodedImage,
    result: &ClassifyResult,
  ) -> Result<(), Self::Error> {
    let results = result
      .items
      .iter()
      .map(|item| {
        json!({
          "index": item.index,
          "label": item.label,
          "score": item.score,
        })
      })
      .collect();
    self.write_document(frame, "classify", results)
  }
}

impl<W: Write> Render<DetectResult> for JsonOutput<W> {
  type Error = OutputError;

  fn render_result(
    &mut self,
    frame: &DecodedImage,
    result: &DetectResult,
  ) -> Result<(), Self::Error> {
    let results = result
      .items
      .iter()
      .map(|item| {
        json!({
          "index": item.index,
          "class_id": item.class_id,
          "label": item.label,
          "score": item.score,
          "bbox": item.bbox,
          "rect": {
            "y": item.rect.y,
            "x": item.rect.x,
            "h": item.rect.h,
            "w": item.rect.w,
          },
        })
      })
      .collect();
    self.write_document(frame, "detect", results)
  }
}

pub enum OutputWrapper<W> {
  Text(TextOutput<W>),
  Record(RecordOutput<W>),
  Json(JsonOutput<W>),
}

impl<W: Write> OutputWrapper<W> {
  pub fn new(format: OutputFormat, writer: W) -> Self {
    match format {
      OutputFormat::Text => OutputWrapper::Text(TextOutput::new(writer)),
      OutputFormat::Record => OutputWrapper::Record(RecordOutput::new(writer)),
      OutputFormat::Json => OutputWrapper::Json(JsonOutput::new(writer)),
    }
  }

  pub fn into_inner(self) -> W {
    match self {
      OutputWrapper::Text(output) => output.into_inner(),
      OutputWrapper::Record(output) => output.into_inner(),
      OutputWrapper::Json(output) => output.into_inner(),
    }
  }
}

impl<W, T> Render<T> for OutputWrapper<W>
where
  W: Write,
  TextOutput<W>: Render<T, Error = OutputError>,
  RecordOutput<W>: Render<T, Error = OutputError>,
  JsonOutput<W>: Render<T, Error = OutputError>,
{
  type Error = OutputError;

  fn render_result(&mut self, frame: &DecodedImage, result: &T) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Text(output) => output.render_result(frame, result),
      OutputWrapper::Record(output) => output.render_result(frame, result),
      OutputWrapper::Json(output) => output.render_result(frame, result),
    }
  }
}
