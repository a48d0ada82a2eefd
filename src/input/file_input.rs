// 该文件是 Cheliu （车流） 项目的一部分。
// src/input/file_input.rs - 本地文件输入
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
use tracing::error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  candidate::{FileContent, RawFileEntry},
};

#[derive(Error, Debug)]
pub enum FileInputError {
  #[error("URI scheme mismatch")]
  SchemeMismatch,
  #[error("Invalid file path: {0}")]
  InvalidPath(String),
}

/// `file:///path/to/street.jpg[?type=image/jpeg]`
#[derive(Debug)]
pub struct FileInput {
  entry: RawFileEntry,
}

impl FromUrlWithScheme for FileInput {
  const SCHEME: &'static str = "file";
}

impl FromUrl for FileInput {
  type Error = FileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(FileInputError::SchemeMismatch);
    }

    let path = url
      .to_file_path()
      .map_err(|_| FileInputError::InvalidPath(url.to_string()))?;
    let name = path
      .file_name()
      .and_then(|name| name.to_str())
      .ok_or_else(|| FileInputError::InvalidPath(url.to_string()))?
      .to_string();

    let declared = url
      .query_pairs()
      .find(|(k, _)| k == "type")
      .map(|(_, v)| v.into_owned());

    Ok(FileInput {
      entry: RawFileEntry::new(name, declared.as_deref(), FileContent::Path(path)),
    })
  }
}

impl FileInput {
  pub fn entry(&self) -> &RawFileEntry {
    &self.entry
  }

  pub fn into_entry(self) -> RawFileEntry {
    self.entry
  }
}
