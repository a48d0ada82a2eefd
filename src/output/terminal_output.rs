// 该文件是 Cheliu （车流） 项目的一部分。
// src/output/terminal_output.rs - 终端文本输出
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

use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::ProcessedResult,
  output::{FailureNotice, OutputError, Render},
};

type Sink = Mutex<Box<dyn Write + Send>>;

/// 结果写到标准输出，失败提示写到标准错误
pub struct TerminalOutput {
  out: Sink,
  err: Sink,
}

impl FromUrlWithScheme for TerminalOutput {
  const SCHEME: &'static str = "term";
}

impl FromUrl for TerminalOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch);
    }
    Ok(Self::default())
  }
}

impl Default for TerminalOutput {
  fn default() -> Self {
    Self::with_writers(Box::new(std::io::stdout()), Box::new(std::io::stderr()))
  }
}

impl TerminalOutput {
  pub fn with_writers(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
    Self {
      out: Mutex::new(out),
      err: Mutex::new(err),
    }
  }

  fn write(sink: &Sink, text: &str) -> std::io::Result<()> {
    let mut writer = sink.lock().unwrap_or_else(PoisonError::into_inner);
    writer.write_all(text.as_bytes())?;
    writer.flush()
  }
}

pub fn format_result(result: &ProcessedResult) -> String {
  let mut text = format!(
    "Analysis Results\nVehicles Detected: {}\n",
    result.vehicle_count()
  );
  for (index, number) in result.vehicle_numbers().iter().enumerate() {
    text.push_str(&format!("Vehicle {}: {}\n", index + 1, number));
  }
  if let Some(url) = result.processed_image_url() {
    text.push_str(&format!("Processed Image: {}\n", url));
  }
  text
}

impl Render for TerminalOutput {
  type Error = std::io::Error;

  fn render_result(&self, result: ProcessedResult) -> Result<(), Self::Error> {
    Self::write(&self.out, &format_result(&result))
  }

  fn render_failure(&self, notice: &FailureNotice) -> Result<(), Self::Error> {
    Self::write(&self.err, &format!("{}\n", notice.message()))
  }
}
