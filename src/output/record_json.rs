// 该文件是 Weibei （渭北春树） 项目的一部分。
// src/output/record_json.rs - JSON 结果记录
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

use std::path::Path;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::ImageFrame, model::Detection, output::Render};

/// 把检测结果按 camelCase 键名写成 JSON 数组文件。
pub struct RecordJsonOutput {
  path: String,
  pretty: bool,
}

#[derive(Error, Debug)]
pub enum RecordJsonError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl From<std::io::Error> for RecordJsonError {
  fn from(err: std::io::Error) -> Self {
    RecordJsonError::IoError(err)
  }
}

impl From<serde_json::Error> for RecordJsonError {
  fn from(err: serde_json::Error) -> Self {
    RecordJsonError::JsonError(err)
  }
}

impl FromUrlWithScheme for RecordJsonOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordJsonOutput {
  type Error = RecordJsonError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RecordJsonError::SchemeMismatch(format!(
        "期望记录方式 '{}', 实际记录方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let pretty = url.query_pairs().any(|(key, _)| key == "pretty");

    Ok(RecordJsonOutput {
      path: url.path().to_string(),
      pretty,
    })
  }
}

impl RecordJsonOutput {
  fn write_records(&self, result: &Vec<Detection>) -> Result<(), RecordJsonError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(&self.path)?;
    if self.pretty {
      serde_json::to_writer_pretty(file, result)?;
    } else {
      serde_json::to_writer(file, result)?;
    }

    info!("记录 {} 个检测结果到: {}", result.len(), self.path);

    Ok(())
  }
}

impl Render<ImageFrame, Vec<Detection>> for RecordJsonOutput {
  type Error = RecordJsonError;

  fn render_result(&self, _frame: &ImageFrame, result: &Vec<Detection>) -> Result<(), Self::Error> {
    self.write_records(result)
  }
}
