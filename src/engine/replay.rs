// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/engine/replay.rs - 回放引擎
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

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, engine::Engine, frame::RgbPlanarFrame};

/// JSON 张量文件：裸数组或带 tensor 字段的对象。
#[derive(Deserialize)]
#[serde(untagged)]
enum TensorFile {
  Flat(Vec<f32>),
  Tagged { tensor: Vec<f32> },
}

/// 从文件回放一条固定张量的引擎，每帧都返回同一结果。
/// 输入帧内容被忽略。
pub struct ReplayEngine {
  tensor: Vec<f32>,
}

#[derive(Error, Debug)]
pub enum ReplayEngineError {
  #[error("URI 方案不匹配: 期望 'replay', 实际 '{0}'")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("张量文件解析错误: {0}")]
  JsonError(serde_json::Error),
}

impl From<std::io::Error> for ReplayEngineError {
  fn from(err: std::io::Error) -> Self {
    ReplayEngineError::IoError(err)
  }
}

impl From<serde_json::Error> for ReplayEngineError {
  fn from(err: serde_json::Error) -> Self {
    ReplayEngineError::JsonError(err)
  }
}

impl FromUrlWithScheme for ReplayEngine {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayEngine {
  type Error = ReplayEngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayEngineError::SchemeMismatch(url.scheme().to_string()));
    }

    let path = url.path();
    info!("加载回放张量文件: {}", path);
    let data = std::fs::read_to_string(path)?;
    let tensor = match serde_json::from_str::<TensorFile>(&data)? {
      TensorFile::Flat(tensor) => tensor,
      TensorFile::Tagged { tensor } => tensor,
    };
    debug!("回放张量长度: {}", tensor.len());

    Ok(ReplayEngine { tensor })
  }
}

impl ReplayEngine {
  pub fn from_vec(tensor: Vec<f32>) -> Self {
    ReplayEngine { tensor }
  }

  pub fn tensor_len(&self) -> usize {
    self.tensor.len()
  }
}

impl Engine for ReplayEngine {
  type Error = ReplayEngineError;

  fn infer(&self, _frame: &RgbPlanarFrame) -> Result<Vec<f32>, Self::Error> {
    Ok(self.tensor.clone())
  }
}
