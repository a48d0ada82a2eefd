// 该文件是 Cheliu （车流） 项目的一部分。
// src/output.rs - 结果展示定义
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

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::ProcessedResult,
  session::{ErrorInfo, ErrorKind},
};

/// 展示给用户的统一失败提示，不区分失败原因
pub const USER_FAILURE_MESSAGE: &str = "Failed to process the file. Please try again.";

/// 展示层：成功时接收结果的所有权，失败时接收一条通知
pub trait Render {
  type Error;
  fn render_result(&self, result: ProcessedResult) -> Result<(), Self::Error>;
  fn render_failure(&self, notice: &FailureNotice) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
  session: u64,
  file_name: Option<String>,
  error: ErrorInfo,
}

impl FailureNotice {
  pub fn new(session: u64, file_name: Option<String>, error: ErrorInfo) -> Self {
    Self {
      session,
      file_name,
      error,
    }
  }

  pub fn session(&self) -> u64 {
    self.session
  }

  pub fn file_name(&self) -> Option<&str> {
    self.file_name.as_deref()
  }

  /// 仅用于日志与记录，不直接展示给用户
  pub fn error(&self) -> &ErrorInfo {
    &self.error
  }

  pub fn message(&self) -> &'static str {
    USER_FAILURE_MESSAGE
  }
}

/// JSON 与目录记录共用的结构
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum OutcomeRecord<'a> {
  Succeeded {
    #[serde(rename = "recordedAt")]
    recorded_at: String,
    result: &'a ProcessedResult,
  },
  Failed {
    #[serde(rename = "recordedAt")]
    recorded_at: String,
    session: u64,
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
    message: &'static str,
    cause: ErrorKind,
    detail: &'a str,
  },
}

impl<'a> OutcomeRecord<'a> {
  pub(crate) fn succeeded(result: &'a ProcessedResult) -> Self {
    OutcomeRecord::Succeeded {
      recorded_at: chrono::Utc::now().to_rfc3339(),
      result,
    }
  }

  pub(crate) fn failed(notice: &'a FailureNotice) -> Self {
    OutcomeRecord::Failed {
      recorded_at: chrono::Utc::now().to_rfc3339(),
      session: notice.session(),
      file_name: notice.file_name(),
      message: notice.message(),
      cause: notice.error().kind(),
      detail: notice.error().message(),
    }
  }
}

mod terminal_output;
pub use self::terminal_output::{TerminalOutput, format_result};

mod json_output;
pub use self::json_output::{JsonOutput, JsonOutputError};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("终端输出错误: {0}")]
  TerminalOutputError(#[from] std::io::Error),
  #[error("JSON 输出错误: {0}")]
  JsonOutputError(#[from] JsonOutputError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  Terminal(TerminalOutput),
  Json(JsonOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecord(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      TerminalOutput::SCHEME => Ok(OutputWrapper::Terminal(TerminalOutput::from_url(url)?)),
      JsonOutput::SCHEME => Ok(OutputWrapper::Json(JsonOutput::from_url(url)?)),
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => Ok(OutputWrapper::DirectoryRecord(
        DirectoryRecordOutput::from_url(url)?,
      )),
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Render for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, result: ProcessedResult) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Terminal(output) => output.render_result(result).map_err(OutputError::from),
      OutputWrapper::Json(output) => output.render_result(result).map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecord(output) => {
        output.render_result(result).map_err(OutputError::from)
      }
    }
  }

  fn render_failure(&self, notice: &FailureNotice) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Terminal(output) => output.render_failure(notice).map_err(OutputError::from),
      OutputWrapper::Json(output) => output.render_failure(notice).map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecord(output) => {
        output.render_failure(notice).map_err(OutputError::from)
      }
    }
  }
}
