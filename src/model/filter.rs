// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/model/filter.rs - 结果过滤
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

use crate::{config::DetectConfig, model::Detection};

/// 按置信度门限、重叠收缩、去重、排序、截断的顺序过滤候选检测。
///
/// 重叠收缩不剔除候选，而是把同标签、IoU 超限的候选框收缩为交集；
/// 根候选的框在一轮内逐步更新，后续比较使用已收缩的框。
/// 收缩产生的完全相同的框只保留最先出现的一个。
pub fn filter(mut detections: Vec<Detection>, config: &DetectConfig) -> Vec<Detection> {
  detections.retain(|d| d.objectness > config.confidence_threshold);
  debug!("置信度门限后剩余 {} 个候选", detections.len());

  let mut results = if config.iou_suppression {
    for i in 0..detections.len() {
      for j in 0..detections.len() {
        if detections[j].top_class.label != detections[i].top_class.label {
          continue;
        }
        let root = detections[i].bbox;
        let other = detections[j].bbox;
        if root.iou(&other) > config.iou_threshold {
          detections[i].bbox = root.intersection(&other);
        }
      }
    }

    let mut unique: Vec<Detection> = Vec::with_capacity(detections.len());
    for detection in detections {
      if !unique.iter().any(|kept| kept.bbox == detection.bbox) {
        unique.push(detection);
      }
    }
    debug!("去重后剩余 {} 个候选", unique.len());
    unique
  } else {
    detections
  };

  results.sort_by(|a, b| {
    b.top_class
      .confidence
      .partial_cmp(&a.top_class.confidence)
      .unwrap_or(std::cmp::Ordering::Equal)
  });
  results.truncate(config.max_results);

  debug!("最终输出 {} 个检测结果", results.len());
  results
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    config::Anchor,
    geometry::Rect,
    model::{ClassScore, Detection},
  };

  fn test_config() -> DetectConfig {
    DetectConfig {
      input_width: 416,
      input_height: 416,
      grid_width: 13,
      grid_height: 13,
      anchors: vec![Anchor {
        width: 1.0,
        height: 1.0,
      }],
      labels: vec!["cat".to_string(), "dog".to_string()],
      confidence_threshold: 0.3,
      iou_suppression: true,
      iou_threshold: 0.5,
      max_results: 5,
    }
  }

  fn detection(label: &str, confidence: f32, objectness: f32, bbox: Rect) -> Detection {
    let top_class = ClassScore {
      label: label.to_string(),
      confidence,
    };
    Detection {
      grid_column: 0,
      grid_row: 0,
      anchor_index: 0,
      objectness,
      bbox,
      class_scores: vec![top_class.clone()],
      top_class,
      raw_channels: Vec::new().into_boxed_slice(),
    }
  }

  #[test]
  fn empty_input_yields_empty_output() {
    let config = test_config();
    assert!(filter(Vec::new(), &config).is_empty());
  }

  #[test]
  fn gate_is_strict() {
    let mut config = test_config();
    config.confidence_threshold = 0.5;
    let at_limit = detection("cat", 0.5, 0.5, Rect::new(0.0, 0.0, 10.0, 10.0));
    let above = detection("cat", 0.6, 0.6, Rect::new(100.0, 100.0, 10.0, 10.0));
    let results = filter(vec![at_limit, above], &config);
    assert_eq!(results.len(), 1);
    assert!((results[0].objectness - 0.6).abs() < 1e-6);
  }

  #[test]
  fn threshold_of_one_drops_everything() {
    let mut config = test_config();
    config.confidence_threshold = 1.0;
    let d = detection("cat", 0.99, 0.99, Rect::new(0.0, 0.0, 10.0, 10.0));
    assert!(filter(vec![d], &config).is_empty());
  }

  #[test]
  fn overlapping_same_label_narrows_and_collapses() {
    let mut config = test_config();
    config.iou_threshold = 0.1;
    let a = detection("cat", 0.9, 0.9, Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = detection("cat", 0.8, 0.8, Rect::new(5.0, 5.0, 10.0, 10.0));
    // IoU = 25/175 ≈ 0.143 > 0.1：a 收缩为交集，随后 b 对已收缩的 a
    // 重叠度更高，也收缩为同一交集，去重只留第一个
    let results = filter(vec![a, b], &config);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].bbox, Rect::new(5.0, 5.0, 5.0, 5.0));
    assert!((results[0].top_class.confidence - 0.9).abs() < 1e-6);
    assert!(results[0].bbox.area() <= 100.0);
  }

  #[test]
  fn below_iou_limit_keeps_both_boxes() {
    let config = test_config();
    // IoU ≈ 0.143 < 0.5：不收缩
    let a = detection("cat", 0.9, 0.9, Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = detection("cat", 0.8, 0.8, Rect::new(5.0, 5.0, 10.0, 10.0));
    let results = filter(vec![a, b], &config);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].bbox, Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(results[1].bbox, Rect::new(5.0, 5.0, 10.0, 10.0));
  }

  #[test]
  fn different_labels_do_not_narrow() {
    let mut config = test_config();
    config.iou_threshold = 0.1;
    let a = detection("cat", 0.9, 0.9, Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = detection("dog", 0.8, 0.8, Rect::new(5.0, 5.0, 10.0, 10.0));
    let results = filter(vec![a, b], &config);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].bbox, Rect::new(0.0, 0.0, 10.0, 10.0));
  }

  #[test]
  fn suppression_disabled_skips_narrowing() {
    let mut config = test_config();
    config.iou_suppression = false;
    config.iou_threshold = 0.1;
    let a = detection("cat", 0.9, 0.9, Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = detection("cat", 0.8, 0.8, Rect::new(5.0, 5.0, 10.0, 10.0));
    let results = filter(vec![a, b], &config);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].bbox, Rect::new(0.0, 0.0, 10.0, 10.0));
  }

  #[test]
  fn results_sorted_descending_and_truncated() {
    let mut config = test_config();
    config.max_results = 2;
    config.iou_suppression = false;
    let detections = vec![
      detection("cat", 0.4, 0.4, Rect::new(0.0, 0.0, 1.0, 1.0)),
      detection("dog", 0.9, 0.9, Rect::new(10.0, 0.0, 1.0, 1.0)),
      detection("cat", 0.7, 0.7, Rect::new(20.0, 0.0, 1.0, 1.0)),
    ];
    let results = filter(detections, &config);
    assert_eq!(results.len(), 2);
    assert!((results[0].top_class.confidence - 0.9).abs() < 1e-6);
    assert!((results[1].top_class.confidence - 0.7).abs() < 1e-6);
  }

  #[test]
  fn identical_boxes_collapse_to_first() {
    let mut config = test_config();
    config.iou_threshold = 0.4;
    let a = detection("cat", 0.6, 0.6, Rect::new(0.0, 0.0, 10.0, 10.0));
    let b = detection("cat", 0.8, 0.8, Rect::new(0.0, 0.0, 10.0, 10.0));
    // 完全相同的框互相收缩后仍相同，去重保留先出现的 a
    let results = filter(vec![a, b], &config);
    assert_eq!(results.len(), 1);
    assert!((results[0].top_class.confidence - 0.6).abs() < 1e-6);
  }
}
