//! Shared fixtures: hand-built bitmap files and a scripted inference runtime.

#![allow(dead_code)]

use shanan_classify::{
  frame::TensorShape,
  input::{BMP_HEADER_SIZE, BMP_INFO_HEADER_SIZE, row_padding},
  runtime::{InferenceRuntime, OutputTensor},
};

/// Builds a bitmap from rows given in on-disk order (bottom-up unless
/// `height` is negative, channel bytes as stored).
pub fn bitmap(width: i32, height: i32, bpp: u16, stored_rows: &[Vec<u8>]) -> Vec<u8> {
  let channels = usize::from(bpp / 8);
  let padding = row_padding(width as usize, channels);

  let mut out = Vec::new();
  out.extend_from_slice(b"BM");
  out.extend_from_slice(&[0; 8]);
  out.extend_from_slice(&(BMP_HEADER_SIZE as u32).to_le_bytes());
  out.extend_from_slice(&(BMP_INFO_HEADER_SIZE as u32).to_le_bytes());
  out.extend_from_slice(&width.to_le_bytes());
  out.extend_from_slice(&height.to_le_bytes());
  out.extend_from_slice(&1u16.to_le_bytes());
  out.extend_from_slice(&bpp.to_le_bytes());
  out.extend_from_slice(&[0; 24]);
  for row in stored_rows {
    out.extend_from_slice(row);
    out.extend(std::iter::repeat_n(0, padding));
  }
  out
}

/// Runtime that records its input and replays canned outputs.
pub struct ScriptedRuntime {
  pub shape: Option<TensorShape>,
  pub outputs: Vec<OutputTensor>,
  pub input: Vec<u8>,
  pub runs: usize,
}

impl ScriptedRuntime {
  pub fn new(shape: Option<TensorShape>, outputs: Vec<OutputTensor>) -> Self {
    Self {
      shape,
      outputs,
      input: Vec::new(),
      runs: 0,
    }
  }
}

impl InferenceRuntime for ScriptedRuntime {
  type Error = std::io::Error;

  fn input_shape(&self) -> Option<TensorShape> {
    self.shape
  }

  fn set_input(&mut self, data: &[u8]) -> Result<(), Self::Error> {
    self.input = data.to_vec();
    Ok(())
  }

  fn run(&mut self) -> Result<(), Self::Error> {
    if self.input.is_empty() {
      return Err(std::io::Error::other("input not bound"));
    }
    self.runs += 1;
    Ok(())
  }

  fn outputs(&self) -> Result<Vec<OutputTensor>, Self::Error> {
    Ok(self.outputs.clone())
  }
}
