// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/model/decode.rs - 张量解码
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

use thiserror::Error;
use tracing::debug;

use crate::{
  config::DetectConfig,
  geometry::Rect,
  math::{sigmoid, softmax},
  model::{ClassScore, Detection},
};

const UNKNOWN_LABEL: &str = "unknown";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
  #[error("张量形状不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  ShapeMismatch { expected: usize, actual: usize },
}

/// 把通道主序的原始张量解码为每个 (列, 行, 锚框) 的候选检测。
///
/// 原始布局为 `[通道][列][行]`，其中通道号 = 锚框序号 × 每锚框通道数 + 通道内偏移。
pub fn decode(raw: &[f32], config: &DetectConfig) -> Result<Vec<Detection>, DecodeError> {
  let expected = config.tensor_len();
  if raw.len() != expected {
    return Err(DecodeError::ShapeMismatch {
      expected,
      actual: raw.len(),
    });
  }

  let grid_width = config.grid_width;
  let grid_height = config.grid_height;
  let anchor_count = config.anchor_count();
  let channels = config.channels_per_anchor();
  let spatial = grid_width * grid_height;

  let mut detections = Vec::with_capacity(spatial * anchor_count);
  let mut slice = vec![0.0f32; channels];
  for column in 0..grid_width {
    for row in 0..grid_height {
      for anchor in 0..anchor_count {
        for (offset, value) in slice.iter_mut().enumerate() {
          *value = raw[(anchor * channels + offset) * spatial + column * grid_height + row];
        }
        detections.push(build_detection(&slice, column, row, anchor, config));
      }
    }
  }

  debug!("解码得到 {} 个候选目标", detections.len());
  Ok(detections)
}

/// 由一个锚框的通道切片构造检测结果。
///
/// 切片布局: `[x, y, w, h, objectness, 类别 0, 类别 1, ...]`，
/// 长度等于配置的每锚框通道数。
pub fn build_detection(
  slice: &[f32],
  column: usize,
  row: usize,
  anchor_index: usize,
  config: &DetectConfig,
) -> Detection {
  let cell_width = config.cell_width();
  let cell_height = config.cell_height();
  let anchor = &config.anchors[anchor_index];

  let objectness = sigmoid(slice[4]);

  let center_x = (sigmoid(slice[0]) + column as f32) * cell_width;
  let center_y = (sigmoid(slice[1]) + row as f32) * cell_height;
  let width = slice[2].exp() * cell_width * anchor.width;
  let height = slice[3].exp() * cell_height * anchor.height;
  let bbox = Rect::new(
    center_x - width / 2.0,
    center_y - height / 2.0,
    width,
    height,
  );

  let mut class_scores = Vec::with_capacity(slice.len() - 5);
  for (index, probability) in softmax(&slice[5..]).into_iter().enumerate() {
    let label = config
      .labels
      .get(index)
      .map(String::as_str)
      .unwrap_or(UNKNOWN_LABEL)
      .to_string();
    class_scores.push(ClassScore {
      label,
      confidence: probability * objectness,
    });
  }

  let mut top_index = 0usize;
  let mut top_confidence = f32::MIN;
  for (index, score) in class_scores.iter().enumerate() {
    if score.confidence > top_confidence {
      top_confidence = score.confidence;
      top_index = index;
    }
  }
  let top_class = class_scores.get(top_index).cloned().unwrap_or(ClassScore {
    label: UNKNOWN_LABEL.to_string(),
    confidence: 0.0,
  });

  Detection {
    grid_column: column,
    grid_row: row,
    anchor_index,
    objectness,
    bbox,
    class_scores,
    top_class,
    raw_channels: slice.to_vec().into_boxed_slice(),
  }
}
