// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/config.rs - 检测配置
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::FromUrl;

const CONFIG_FILE_SCHEME: &str = "config";
const CONFIG_PRESET_SCHEME: &str = "preset";

const TINY_YOLO_VOC_PRESET: &str = "tiny-yolo-voc";

const TINY_YOLO_VOC_ANCHORS: [(f32, f32); 5] = [
  (1.08, 1.19),
  (3.42, 4.41),
  (6.63, 11.38),
  (9.42, 5.11),
  (16.62, 10.52),
];

const VOC_LABELS: [&str; 20] = [
  "aeroplane",
  "bicycle",
  "bird",
  "boat",
  "bottle",
  "bus",
  "car",
  "cat",
  "chair",
  "cow",
  "diningtable",
  "dog",
  "horse",
  "motorbike",
  "person",
  "pottedplant",
  "sheep",
  "sofa",
  "train",
  "tvmonitor",
];

/// 每个网格单元的锚框尺度，单位为网格单元。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
  pub width: f32,
  pub height: f32,
}

/// 网格检测头的完整配置。
///
/// 网络输入为 `input_width` x `input_height` 像素，划分为
/// `grid_width` x `grid_height` 个单元，每个单元预测 `anchors.len()`
/// 个候选框，每个候选框带 5 个几何/置信度通道和 `labels.len()` 个类别通道。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
  pub input_width: u32,
  pub input_height: u32,
  pub grid_width: usize,
  pub grid_height: usize,
  pub anchors: Vec<Anchor>,
  pub labels: Vec<String>,
  pub confidence_threshold: f32,
  pub iou_suppression: bool,
  pub iou_threshold: f32,
  pub max_results: usize,
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("配置无效: {0}")]
  InvalidConfig(String),
  #[error("配置地址必须使用 config 或 preset 方案, 实际为 {0}")]
  SchemeMismatch(String),
  #[error("未知预设: {0}")]
  UnknownPreset(String),
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(serde_json::Error),
}

impl From<std::io::Error> for ConfigError {
  fn from(err: std::io::Error) -> Self {
    ConfigError::IoError(err)
  }
}

impl From<serde_json::Error> for ConfigError {
  fn from(err: serde_json::Error) -> Self {
    ConfigError::JsonError(err)
  }
}

impl DetectConfig {
  /// tiny-YOLOv2 VOC 预设：416x416 输入、13x13 网格、5 锚框、20 类别。
  pub fn tiny_yolo_voc() -> Self {
    DetectConfig {
      input_width: 416,
      input_height: 416,
      grid_width: 13,
      grid_height: 13,
      anchors: TINY_YOLO_VOC_ANCHORS
        .iter()
        .map(|&(width, height)| Anchor { width, height })
        .collect(),
      labels: VOC_LABELS.iter().map(|s| s.to_string()).collect(),
      confidence_threshold: 0.3,
      iou_suppression: true,
      iou_threshold: 0.5,
      max_results: 5,
    }
  }

  pub fn anchor_count(&self) -> usize {
    self.anchors.len()
  }

  pub fn class_count(&self) -> usize {
    self.labels.len()
  }

  /// 每个锚框的通道数：x, y, w, h, objectness 加类别数。
  pub fn channels_per_anchor(&self) -> usize {
    5 + self.labels.len()
  }

  /// 合法原始张量的总长度。
  pub fn tensor_len(&self) -> usize {
    self.grid_width * self.grid_height * self.anchors.len() * self.channels_per_anchor()
  }

  pub fn cell_width(&self) -> f32 {
    self.input_width as f32 / self.grid_width as f32
  }

  pub fn cell_height(&self) -> f32 {
    self.input_height as f32 / self.grid_height as f32
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.input_width == 0 || self.input_height == 0 {
      return Err(ConfigError::InvalidConfig(format!(
        "输入尺寸无效: {}x{}",
        self.input_width, self.input_height
      )));
    }
    if self.grid_width == 0 || self.grid_height == 0 {
      return Err(ConfigError::InvalidConfig(format!(
        "网格尺寸无效: {}x{}",
        self.grid_width, self.grid_height
      )));
    }
    if self.anchors.is_empty() {
      return Err(ConfigError::InvalidConfig("至少需要一个锚框".to_string()));
    }
    for (index, anchor) in self.anchors.iter().enumerate() {
      if !anchor.width.is_finite()
        || !anchor.height.is_finite()
        || anchor.width <= 0.0
        || anchor.height <= 0.0
      {
        return Err(ConfigError::InvalidConfig(format!(
          "锚框 {} 的尺度无效: {}x{}",
          index, anchor.width, anchor.height
        )));
      }
    }
    if self.labels.is_empty() {
      return Err(ConfigError::InvalidConfig(
        "至少需要一个类别标签".to_string(),
      ));
    }
    if !self.confidence_threshold.is_finite() {
      return Err(ConfigError::InvalidConfig(format!(
        "置信度阈值无效: {}",
        self.confidence_threshold
      )));
    }
    if self.iou_suppression && !self.iou_threshold.is_finite() {
      return Err(ConfigError::InvalidConfig(format!(
        "IoU 阈值无效: {}",
        self.iou_threshold
      )));
    }
    if self.max_results == 0 {
      return Err(ConfigError::InvalidConfig(
        "最大结果数必须至少为 1".to_string(),
      ));
    }
    Ok(())
  }
}

impl FromUrl for DetectConfig {
  type Error = ConfigError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      CONFIG_FILE_SCHEME => {
        let path = url.path();
        info!("加载检测配置文件: {}", path);
        let data = std::fs::read_to_string(path)?;
        let config: DetectConfig = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(
          "配置加载完成: {}x{} 网格, {} 锚框, {} 类别",
          config.grid_width,
          config.grid_height,
          config.anchor_count(),
          config.class_count()
        );
        Ok(config)
      }
      CONFIG_PRESET_SCHEME => match url.path() {
        TINY_YOLO_VOC_PRESET => {
          info!("使用预设配置: {}", TINY_YOLO_VOC_PRESET);
          Ok(DetectConfig::tiny_yolo_voc())
        }
        other => Err(ConfigError::UnknownPreset(other.to_string())),
      },
      other => Err(ConfigError::SchemeMismatch(other.to_string())),
    }
  }
}
