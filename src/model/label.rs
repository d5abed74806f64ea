// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/label.rs - 标签表
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

use std::{
  borrow::Cow,
  convert::Infallible,
  fs::File,
  io::{BufRead, BufReader},
  path::Path,
  str::FromStr,
};

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签文件为空")]
  Empty,
}

/// 类别索引到显示名称的映射，每行一个标签
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
  entries: Vec<String>,
}

impl LabelTable {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    let table = Self::from_reader(BufReader::new(File::open(path)?))?;
    debug!("从 {} 读取 {} 个标签", path.display(), table.len());
    Ok(table)
  }

  pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LabelError> {
    let entries = reader.lines().collect::<Result<Vec<_>, _>>()?;
    Ok(Self { entries })
  }

  pub fn from_lines<I, S>(lines: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      entries: lines.into_iter().map(Into::into).collect(),
    }
  }

  /// 同 [`LabelTable::load`]，但拒绝空标签文件
  pub fn load_non_empty(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let table = Self::load(path)?;
    if table.is_empty() {
      return Err(LabelError::Empty);
    }
    Ok(table)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// 越界时返回索引本身的十进制形式
  pub fn lookup(&self, index: i64) -> Cow<'_, str> {
    usize::try_from(index)
      .ok()
      .and_then(|i| self.entries.get(i))
      .map(|label| Cow::Borrowed(label.as_str()))
      .unwrap_or_else(|| Cow::Owned(index.to_string()))
  }
}

impl FromStr for LabelTable {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self::from_lines(s.lines()))
  }
}
