// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/ranker.rs - 分数反量化与排序
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

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedResult {
  pub index: usize,
  pub score: f32,
}

/// 8 位量化张量反量化：`scale * (q - zero_point)`
pub fn dequantize(raw: &[u8], scale: f32, zero_point: i32) -> Vec<f32> {
  raw
    .iter()
    .map(|&q| scale * (i32::from(q) - zero_point) as f32)
    .collect()
}

/// 保留不低于阈值的分数并按降序排列
///
/// 分数相同时保持原始索引顺序。NaN 永远不会通过阈值。
pub fn rank(scores: &[f32], threshold: f32) -> Vec<RankedResult> {
  let mut selected: Vec<RankedResult> = scores
    .iter()
    .enumerate()
    .filter(|(_, score)| **score >= threshold)
    .map(|(index, &score)| RankedResult { index, score })
    .collect();
  // 稳定排序
  selected.sort_by(|a, b| b.score.total_cmp(&a.score));
  selected
}

/// `rank` 的结果截取前 `k` 项，`None` 表示不限制
pub fn top_k(scores: &[f32], threshold: f32, k: Option<usize>) -> Vec<RankedResult> {
  let mut ranked = rank(scores, threshold);
  if let Some(k) = k {
    ranked.truncate(k);
  }
  ranked
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pairs(results: &[RankedResult]) -> Vec<(usize, f32)> {
    results.iter().map(|r| (r.index, r.score)).collect()
  }

  #[test]
  fn rank_is_descending_with_inclusive_threshold() {
    let ranked = rank(&[0.9, 0.2, 0.95, 0.5], 0.5);
    assert_eq!(pairs(&ranked), vec![(2, 0.95), (0, 0.9), (3, 0.5)]);
  }

  #[test]
  fn rank_of_nothing_is_empty() {
    assert!(rank(&[], 0.1).is_empty());
    assert!(rank(&[0.01, 0.05], 0.1).is_empty());
  }

  #[test]
  fn ties_keep_index_order() {
    let ranked = rank(&[0.3, 0.7, 0.3, 0.7, 0.3], 0.3);
    assert_eq!(
      pairs(&ranked),
      vec![(1, 0.7), (3, 0.7), (0, 0.3), (2, 0.3), (4, 0.3)]
    );
  }

  #[test]
  fn nan_never_passes() {
    let ranked = rank(&[f32::NAN, 0.4, f32::NAN], f32::NEG_INFINITY);
    assert_eq!(pairs(&ranked), vec![(1, 0.4)]);
  }

  #[test]
  fn top_k_truncates() {
    let scores = [0.1, 0.8, 0.6, 0.9];
    assert_eq!(
      pairs(&top_k(&scores, 0.0, Some(2))),
      vec![(3, 0.9), (1, 0.8)]
    );
    assert_eq!(top_k(&scores, 0.0, None).len(), 4);
    assert!(top_k(&scores, 0.0, Some(0)).is_empty());
  }

  #[test]
  fn dequantize_bytes() {
    assert_eq!(dequantize(&[0, 128, 255], 0.5, 128), vec![-64.0, 0.0, 63.5]);
    assert!(dequantize(&[], 1.0, 0).is_empty());
  }

  #[test]
  fn dequantize_then_rank() {
    let scores = dequantize(&[10, 200, 0, 255], 1.0 / 255.0, 0);
    let ranked = rank(&scores, 0.5);
    assert_eq!(
      ranked.iter().map(|r| r.index).collect::<Vec<_>>(),
      vec![3, 1]
    );
  }
}
