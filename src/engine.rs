// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/engine.rs - 推理引擎
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

use crate::{FromUrl, frame::RgbPlanarFrame};

/// 推理引擎抽象：输入一帧，输出一条扁平的原始张量。
pub trait Engine {
  type Error;
  fn infer(&self, frame: &RgbPlanarFrame) -> Result<Vec<f32>, Self::Error>;
}

#[cfg(feature = "replay_engine")]
mod replay;
#[cfg(feature = "replay_engine")]
pub use self::replay::{ReplayEngine, ReplayEngineError};

#[derive(Error, Debug)]
pub enum EngineError {
  #[cfg(feature = "replay_engine")]
  #[error("回放引擎错误: {0}")]
  ReplayEngineError(#[from] ReplayEngineError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum EngineWrapper {
  #[cfg(feature = "replay_engine")]
  Replay(ReplayEngine),
}

impl FromUrl for EngineWrapper {
  type Error = EngineError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "replay_engine")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ReplayEngine::SCHEME {
        let engine = ReplayEngine::from_url(url)?;
        return Ok(EngineWrapper::Replay(engine));
      }
    }
    Err(EngineError::SchemeMismatch)
  }
}

impl Engine for EngineWrapper {
  type Error = EngineError;

  fn infer(&self, frame: &RgbPlanarFrame) -> Result<Vec<f32>, Self::Error> {
    match self {
      #[cfg(feature = "replay_engine")]
      EngineWrapper::Replay(engine) => engine.infer(frame).map_err(EngineError::from),
    }
  }
}
