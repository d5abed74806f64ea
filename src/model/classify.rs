// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/classify.rs - 分类结果
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

use tracing::debug;

use crate::{
  frame::DecodedImage,
  model::{LabelTable, Model, PostprocessError, output_f32, top_k},
  runtime::OutputTensor,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
  pub index: usize,
  pub score: f32,
  pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClassifyResult {
  pub items: Box<[Classification]>,
}

impl ClassifyResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

/// 单输出分类头：第 0 个输出为每个类别的分数
pub struct Classifier {
  labels: LabelTable,
  threshold: f32,
  top_k: Option<usize>,
}

impl Classifier {
  pub fn new(labels: LabelTable, threshold: f32) -> Self {
    Self {
      labels,
      threshold,
      top_k: None,
    }
  }

  pub fn top_k(mut self, k: Option<usize>) -> Self {
    self.top_k = k;
    self
  }
}

impl Model for Classifier {
  type Output = ClassifyResult;

  fn postprocess(
    &self,
    _frame: &DecodedImage,
    outputs: &[OutputTensor],
  ) -> Result<Self::Output, PostprocessError> {
    let scores = output_f32(outputs, 0)?;
    debug!("分类输出 {} 个分数", scores.len());

    let items = top_k(&scores, self.threshold, self.top_k)
      .into_iter()
      .map(|r| Classification {
        index: r.index,
        score: r.score,
        label: self.labels.lookup(r.index as i64).into_owned(),
      })
      .collect::<Vec<_>>();

    debug!("{} 个类别超过阈值 {}", items.len(), self.threshold);
    Ok(ClassifyResult {
      items: items.into_boxed_slice(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame() -> DecodedImage {
    DecodedImage::new(4, 1, 1, vec![0; 4])
  }

  #[test]
  fn quantized_scores_are_labeled() {
    let labels = LabelTable::from_lines(["background", "cat", "dog"]);
    let classifier = Classifier::new(labels, 0.25);
    let outputs = [OutputTensor::Quantized {
      data: vec![0, 64, 200, 100],
      scale: 1.0 / 256.0,
      zero_point: 0,
    }];

    let result = classifier.postprocess(&frame(), &outputs).unwrap();
    let labels: Vec<_> = result.items.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["dog", "3", "cat"]);
    assert_eq!(result.items[0].index, 2);
  }

  #[test]
  fn top_k_limits_results() {
    let classifier = Classifier::new(LabelTable::default(), 0.0).top_k(Some(1));
    let outputs = [OutputTensor::Float(vec![0.2, 0.7, 0.1])];
    let result = classifier.postprocess(&frame(), &outputs).unwrap();
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].label, "1");
  }

  #[test]
  fn missing_output_is_error() {
    let classifier = Classifier::new(LabelTable::default(), 0.5);
    assert_eq!(
      classifier.postprocess(&frame(), &[]).unwrap_err(),
      PostprocessError::MissingOutput(0)
    );
  }
}
