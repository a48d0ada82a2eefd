// 该文件是 Cheliu （车流） 项目的一部分。
// src/input.rs - 文件输入
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
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, candidate::RawFileEntry};

mod file_input;
pub use self::file_input::{FileInput, FileInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("File input error: {0}")]
  FileInputError(#[from] FileInputError),
  #[error("Invalid input source: {0}")]
  InvalidSource(String),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

pub enum InputWrapper {
  File(FileInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      FileInput::SCHEME => Ok(InputWrapper::File(FileInput::from_url(url)?)),
      _ => Err(InputError::SchemeMismatch),
    }
  }
}

impl InputWrapper {
  pub fn into_entry(self) -> RawFileEntry {
    match self {
      InputWrapper::File(input) => input.into_entry(),
    }
  }
}

/// 一次拖放：按给出的顺序把来源转换为原始条目
///
/// 只有第一个来源必须可用；其余来源转换失败时保留为无法读取的条目，
/// 不影响这次拖放的结果。
pub fn drop_entries<'a, I>(urls: I) -> Result<Vec<RawFileEntry>, InputError>
where
  I: IntoIterator<Item = &'a Url>,
{
  let mut urls = urls.into_iter();
  let Some(first) = urls.next() else {
    return Ok(Vec::new());
  };

  let mut entries = vec![InputWrapper::from_url(first)?.into_entry()];
  entries.extend(urls.map(|url| match InputWrapper::from_url(url) {
    Ok(input) => input.into_entry(),
    Err(err) => {
      debug!("无法使用的来源 {}: {}", url, err);
      RawFileEntry::unresolved(url)
    }
  }));
  Ok(entries)
}

/// 命令行来源既可以是 URL，也可以是本地路径
pub fn parse_source(source: &str) -> Result<Url, InputError> {
  // 单字母 scheme 视为 Windows 盘符
  if let Ok(url) = Url::parse(source) {
    if url.scheme().len() > 1 {
      return Ok(url);
    }
  }

  let path = std::path::absolute(source).map_err(|_| InputError::InvalidSource(source.to_string()))?;
  Url::from_file_path(&path).map_err(|_| InputError::InvalidSource(source.to_string()))
}
