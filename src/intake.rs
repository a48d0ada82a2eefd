// 该文件是 Cheliu （车流） 项目的一部分。
// src/intake.rs - 文件接纳校验
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

use tracing::debug;

use crate::{
  candidate::RawFileEntry,
  policy::{AcceptedTypePolicy, MediaCategory},
};

/// 未被接纳的原因，调用方按静默忽略处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeRejection {
  Empty,
  UnsupportedType { name: String },
}

#[derive(Debug)]
pub enum IntakeOutcome {
  /// 只取第一个条目，其余条目计入 `discarded`
  Admitted {
    entry: RawFileEntry,
    category: MediaCategory,
    discarded: usize,
  },
  Rejected(IntakeRejection),
}

impl IntakeOutcome {
  pub fn is_admitted(&self) -> bool {
    matches!(self, IntakeOutcome::Admitted { .. })
  }
}

#[derive(Debug, Clone, Default)]
pub struct IntakeValidator {
  policy: AcceptedTypePolicy,
}

impl IntakeValidator {
  pub fn new(policy: AcceptedTypePolicy) -> Self {
    Self { policy }
  }

  pub fn admit<I>(&self, entries: I) -> IntakeOutcome
  where
    I: IntoIterator<Item = RawFileEntry>,
  {
    let mut entries = entries.into_iter();
    let Some(entry) = entries.next() else {
      debug!("没有提供文件，忽略");
      return IntakeOutcome::Rejected(IntakeRejection::Empty);
    };
    let discarded = entries.count();
    if discarded > 0 {
      debug!("一次只处理一个文件，忽略其余 {} 个", discarded);
    }

    match self.policy.category_of(entry.name()) {
      Some(category) => IntakeOutcome::Admitted {
        entry,
        category,
        discarded,
      },
      None => {
        debug!("不支持的文件类型: {}", entry.name());
        IntakeOutcome::Rejected(IntakeRejection::UnsupportedType {
          name: entry.name().to_string(),
        })
      }
    }
  }
}
