// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/model.rs - 模型
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
use tracing::debug;

use crate::{
  config::{ConfigError, DetectConfig},
  engine::Engine,
  frame::RgbPlanarFrame,
  geometry::Rect,
  input::AsPlanarFrame,
};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 单个类别的标签与置信度。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassScore {
  pub label: String,
  pub confidence: f32,
}

/// 一个网格单元中某个锚框的检测结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
  pub grid_column: usize,
  pub grid_row: usize,
  pub anchor_index: usize,
  pub objectness: f32,
  #[serde(rename = "box")]
  pub bbox: Rect,
  pub class_scores: Vec<ClassScore>,
  pub top_class: ClassScore,
  pub raw_channels: Box<[f32]>,
}

mod decode;
pub use self::decode::{DecodeError, build_detection, decode};

mod filter;
pub use self::filter::filter;

#[derive(Error, Debug)]
pub enum DetectError<E> {
  #[error("推理引擎错误: {0}")]
  Engine(E),
  #[error("解码错误: {0}")]
  Decode(#[from] DecodeError),
}

/// 解码加过滤的检测器，推理引擎通过 [`Engine`] 接入。
pub struct Detector<E, Frame> {
  engine: E,
  config: DetectConfig,
  _phantom: std::marker::PhantomData<Frame>,
}

impl<E: Engine, Frame> Detector<E, Frame> {
  pub fn new(engine: E, config: DetectConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    debug!(
      "检测器就绪: {}x{} 网格, {} 锚框, {} 类别",
      config.grid_width,
      config.grid_height,
      config.anchor_count(),
      config.class_count()
    );

    let _phantom = std::marker::PhantomData::<Frame>;
    Ok(Detector {
      engine,
      config,
      _phantom,
    })
  }

  pub fn config(&self) -> &DetectConfig {
    &self.config
  }

  pub fn detect(&self, frame: &RgbPlanarFrame) -> Result<Vec<Detection>, DetectError<E::Error>> {
    debug!("执行推理引擎");
    let tensor = self.engine.infer(frame).map_err(DetectError::Engine)?;
    let candidates = decode(&tensor, &self.config)?;
    Ok(filter(candidates, &self.config))
  }
}

impl<E: Engine, Frame: AsPlanarFrame> Model for Detector<E, Frame> {
  type Input = Frame;
  type Output = Vec<Detection>;
  type Error = DetectError<E::Error>;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.detect(input.as_planar())
  }
}
