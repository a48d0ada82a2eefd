// 该文件是 Cheliu （车流） 项目的一部分。
// src/output/json_output.rs - JSON 行输出
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

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::ProcessedResult,
  output::{FailureNotice, OutcomeRecord, Render},
};

#[derive(Error, Debug)]
pub enum JsonOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每个结果输出一行 JSON
pub struct JsonOutput {
  writer: Mutex<Box<dyn Write + Send>>,
}

impl FromUrlWithScheme for JsonOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonOutput {
  type Error = JsonOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonOutputError::SchemeMismatch);
    }
    Ok(Self::with_writer(Box::new(std::io::stdout())))
  }
}

impl JsonOutput {
  pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
    Self {
      writer: Mutex::new(writer),
    }
  }

  fn write_record(&self, record: &OutcomeRecord<'_>) -> Result<(), JsonOutputError> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');

    let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
  }
}

impl Render for JsonOutput {
  type Error = JsonOutputError;

  fn render_result(&self, result: ProcessedResult) -> Result<(), Self::Error> {
    self.write_record(&OutcomeRecord::succeeded(&result))
  }

  fn render_failure(&self, notice: &FailureNotice) -> Result<(), Self::Error> {
    self.write_record(&OutcomeRecord::failed(notice))
  }
}
