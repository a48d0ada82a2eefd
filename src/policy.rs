// 该文件是 Cheliu （车流） 项目的一部分。
// src/policy.rs - 可接受文件类型策略
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

const IMAGE_EXTENSIONS: &[&str] = &[".jpeg", ".jpg", ".png"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov"];

/// 媒体大类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCategory {
  Image,
  Video,
}

impl MediaCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      MediaCategory::Image => "image",
      MediaCategory::Video => "video",
    }
  }
}

/// 可接受文件类型策略，进程启动时构建一次，之后只读
#[derive(Debug, Clone)]
pub struct AcceptedTypePolicy {
  image: &'static [&'static str],
  video: &'static [&'static str],
}

impl Default for AcceptedTypePolicy {
  fn default() -> Self {
    Self {
      image: IMAGE_EXTENSIONS,
      video: VIDEO_EXTENSIONS,
    }
  }
}

impl AcceptedTypePolicy {
  pub fn extensions(&self, category: MediaCategory) -> &[&'static str] {
    match category {
      MediaCategory::Image => self.image,
      MediaCategory::Video => self.video,
    }
  }

  /// 按扩展名（不区分大小写）判断文件所属大类
  pub fn category_of(&self, name: &str) -> Option<MediaCategory> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let dotted = format!(".{}", ext);

    [MediaCategory::Image, MediaCategory::Video]
      .into_iter()
      .find(|category| self.extensions(*category).contains(&dotted.as_str()))
  }

  pub fn is_accepted(&self, name: &str) -> bool {
    self.category_of(name).is_some()
  }
}
