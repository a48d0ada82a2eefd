// 该文件是 Cheliu （车流） 项目的一部分。
// src/candidate.rs - 候选文件定义
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

use std::path::PathBuf;

use tracing::debug;
use url::Url;

/// 原始条目的内容来源
#[derive(Debug, Clone)]
pub enum FileContent {
  Path(PathBuf),
  Memory(Vec<u8>),
  /// 无法在本地读取的来源，只能作为被忽略的条目
  Unresolved(Url),
}

/// 拖放或文件选择给出的原始条目，尚未经过校验
#[derive(Debug, Clone)]
pub struct RawFileEntry {
  name: String,
  mime_type: String,
  content: FileContent,
}

impl RawFileEntry {
  /// 未声明 MIME 类型时按扩展名推断
  pub fn new(name: impl Into<String>, mime_type: Option<&str>, content: FileContent) -> Self {
    let name = name.into();
    let mime_type = match mime_type {
      Some(mime) if !mime.is_empty() => mime.to_string(),
      _ => mime_guess::from_path(&name)
        .first_or_octet_stream()
        .essence_str()
        .to_string(),
    };

    Self {
      name,
      mime_type,
      content,
    }
  }

  pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
    let path = path.into();
    let name = path.file_name()?.to_str()?.to_string();
    Some(Self::new(name, None, FileContent::Path(path)))
  }

  pub fn in_memory(name: impl Into<String>, mime_type: &str, data: Vec<u8>) -> Self {
    Self::new(name, Some(mime_type), FileContent::Memory(data))
  }

  /// 名字取 URL 的最后一段路径，没有时用整个 URL
  pub fn unresolved(url: &Url) -> Self {
    let name = url
      .path_segments()
      .and_then(|segments| segments.last())
      .filter(|segment| !segment.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| url.to_string());
    Self::new(name, None, FileContent::Unresolved(url.clone()))
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn mime_type(&self) -> &str {
    &self.mime_type
  }

  /// 读取内容，得到可提交的候选文件
  pub async fn load(self) -> std::io::Result<CandidateFile> {
    let data = match self.content {
      FileContent::Path(path) => {
        debug!("读取文件: {}", path.display());
        tokio::fs::read(&path).await?
      }
      FileContent::Memory(data) => data,
      FileContent::Unresolved(url) => {
        return Err(std::io::Error::new(
          std::io::ErrorKind::Unsupported,
          format!("无法读取来源: {}", url),
        ));
      }
    };

    Ok(CandidateFile {
      name: self.name,
      mime_type: self.mime_type,
      data,
    })
  }
}

/// 已被接纳、等待提交的文件
#[derive(Debug, Clone)]
pub struct CandidateFile {
  name: String,
  mime_type: String,
  data: Vec<u8>,
}

impl CandidateFile {
  pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
    Self {
      name: name.into(),
      mime_type: mime_type.into(),
      data,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn mime_type(&self) -> &str {
    &self.mime_type
  }

  pub fn byte_length(&self) -> usize {
    self.data.len()
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  pub fn into_parts(self) -> (String, String, Vec<u8>) {
    (self.name, self.mime_type, self.data)
  }
}
