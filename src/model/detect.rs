// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/detect.rs - SSD 检测结果
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
  model::{LabelTable, Model, PostprocessError, output_f32, rank},
  runtime::OutputTensor,
};

const SSD_BOXES: usize = 0;
const SSD_CLASSES: usize = 1;
const SSD_SCORES: usize = 2;
const SSD_COUNT: usize = 3;

/// 像素坐标下的检测框
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
  pub y: i32,
  pub x: i32,
  pub h: i32,
  pub w: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  /// 检测序号
  pub index: usize,
  pub class_id: i64,
  pub label: String,
  pub score: f32,
  pub bbox: [f32; 4], // [y_min, x_min, y_max, x_max]，归一化
  pub rect: PixelBox,
}

#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

/// SSD 后处理头，输出依次为检测框、类别、分数、检测数量
pub struct Detector {
  labels: LabelTable,
  threshold: f32,
}

impl Detector {
  pub fn new(labels: LabelTable, threshold: f32) -> Self {
    Self { labels, threshold }
  }
}

fn to_pixels(bbox: &[f32; 4], height: usize, width: usize) -> PixelBox {
  let (height, width) = (height as f32, width as f32);
  let y = (bbox[0] * height) as i32;
  let x = (bbox[1] * width) as i32;
  PixelBox {
    y,
    x,
    h: (bbox[2] * height) as i32 - y,
    w: (bbox[3] * width) as i32 - x,
  }
}

impl Model for Detector {
  type Output = DetectResult;

  fn postprocess(
    &self,
    frame: &DecodedImage,
    outputs: &[OutputTensor],
  ) -> Result<Self::Output, PostprocessError> {
    let boxes = output_f32(outputs, SSD_BOXES)?;
    let classes = output_f32(outputs, SSD_CLASSES)?;
    let scores = output_f32(outputs, SSD_SCORES)?;
    let count = output_f32(outputs, SSD_COUNT)?;

    let declared = count.first().copied().unwrap_or(0.0);
    // NaN 或负数按 0 处理
    let declared = if declared > 0.0 { declared.ceil() as usize } else { 0 };
    let count = declared.min(scores.len());
    debug!("检测数量: 声明 {}, 有效 {}", declared, count);

    let mut items = Vec::new();
    for r in rank(&scores[..count], self.threshold) {
      let class = *classes.get(r.index).ok_or(PostprocessError::Truncated {
        output: SSD_CLASSES,
        expected: r.index + 1,
        actual: classes.len(),
      })?;
      let bbox: [f32; 4] = boxes
        .get(4 * r.index..4 * r.index + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or(PostprocessError::Truncated {
          output: SSD_BOXES,
          expected: 4 * r.index + 4,
          actual: boxes.len(),
        })?;

      let class_id = class as i64;
      items.push(DetectItem {
        index: r.index,
        class_id,
        label: self.labels.lookup(class_id).into_owned(),
        score: r.score,
        bbox,
        rect: to_pixels(&bbox, frame.height(), frame.width()),
      });
    }

    debug!("检测到 {} 个物体", items.len());
    Ok(DetectResult {
      items: items.into_boxed_slice(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame() -> DecodedImage {
    DecodedImage::new(200, 100, 1, vec![0; 200 * 100])
  }

  fn outputs(
    boxes: Vec<f32>,
    classes: Vec<f32>,
    scores: Vec<f32>,
    count: f32,
  ) -> Vec<OutputTensor> {
    vec![
      OutputTensor::Float(boxes),
      OutputTensor::Float(classes),
      OutputTensor::Float(scores),
      OutputTensor::Float(vec![count]),
    ]
  }

  #[test]
  fn detections_are_ranked_and_boxed() {
    let labels = LabelTable::from_lines(["person", "bicycle"]);
    let detector = Detector::new(labels, 0.5);
    let outputs = outputs(
      vec![0.1, 0.2, 0.5, 0.6, 0.0, 0.0, 1.0, 1.0, 0.25, 0.5, 0.75, 1.0],
      vec![0.0, 1.0, 5.0],
      vec![0.6, 0.3, 0.9],
      3.0,
    );

    let result = detector.postprocess(&frame(), &outputs).unwrap();
    assert_eq!(result.items.len(), 2);

    let first = &result.items[0];
    assert_eq!(first.index, 2);
    assert_eq!(first.label, "5");
    assert_eq!(first.rect, PixelBox { y: 25, x: 100, h: 50, w: 100 });

    let second = &result.items[1];
    assert_eq!(second.index, 0);
    assert_eq!(second.label, "person");
    assert_eq!(second.rect, PixelBox { y: 10, x: 40, h: 40, w: 80 });
  }

  #[test]
  fn count_limits_considered_detections() {
    let detector = Detector::new(LabelTable::default(), 0.0);
    let outputs = outputs(vec![0.0; 8], vec![0.0, 0.0], vec![0.1, 0.9], 1.0);
    let result = detector.postprocess(&frame(), &outputs).unwrap();
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].index, 0);

    let outputs = self::outputs(vec![0.0; 8], vec![0.0; 2], vec![0.9; 2], f32::NAN);
    assert!(detector.postprocess(&frame(), &outputs).unwrap().is_empty());
  }

  #[test]
  fn fractional_count_rounds_up() {
    let detector = Detector::new(LabelTable::default(), 0.0);
    let outputs = outputs(vec![0.0; 12], vec![0.0; 3], vec![0.2, 0.4, 0.6], 1.2);
    let result = detector.postprocess(&frame(), &outputs).unwrap();
    let indices: Vec<_> = result.items.iter().map(|item| item.index).collect();
    assert_eq!(indices, [1, 0]);
  }

  #[test]
  fn negative_count_means_none() {
    let detector = Detector::new(LabelTable::default(), 0.0);
    let outputs = outputs(vec![0.0; 8], vec![0.0; 2], vec![0.9; 2], -1.0);
    assert!(detector.postprocess(&frame(), &outputs).unwrap().is_empty());

    let outputs = self::outputs(vec![0.0; 8], vec![0.0; 2], vec![0.9; 2], 0.0);
    assert!(detector.postprocess(&frame(), &outputs).unwrap().is_empty());
  }

  #[test]
  fn count_beyond_scores_is_capped() {
    let detector = Detector::new(LabelTable::default(), 0.0);
    let outputs = outputs(vec![0.0; 8], vec![0.0; 2], vec![0.3, 0.7], 10.0);
    assert_eq!(detector.postprocess(&frame(), &outputs).unwrap().items.len(), 2);
  }

  #[test]
  fn short_boxes_are_truncated_output() {
    let detector = Detector::new(LabelTable::default(), 0.0);
    let outputs = outputs(vec![0.0; 4], vec![0.0, 0.0], vec![0.1, 0.9], 2.0);
    assert_eq!(
      detector.postprocess(&frame(), &outputs).unwrap_err(),
      PostprocessError::Truncated {
        output: SSD_BOXES,
        expected: 8,
        actual: 4,
      }
    );
  }

  #[test]
  fn missing_count_output() {
    let detector = Detector::new(LabelTable::default(), 0.0);
    let outputs = vec![
      OutputTensor::Float(vec![]),
      OutputTensor::Float(vec![]),
      OutputTensor::Float(vec![]),
    ];
    assert_eq!(
      detector.postprocess(&frame(), &outputs).unwrap_err(),
      PostprocessError::MissingOutput(SSD_COUNT)
    );
  }
}
