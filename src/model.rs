// 该文件是 Cheliu （车流） 项目的一部分。
// src/model.rs - 远程分析服务与结果定义
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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidate::CandidateFile;

mod http_service;
pub use self::http_service::{DEFAULT_ENDPOINT, FILE_FIELD_NAME, HttpAnalysisService};

#[derive(Error, Debug)]
pub enum ServiceError {
  #[error("网络请求失败: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("服务返回错误状态码: {status}")]
  Status { status: u16 },
  #[error("响应格式错误: {0}")]
  MalformedResponse(#[from] serde_json::Error),
  #[error("响应不是 JSON 对象")]
  NotAnObject,
  #[error("响应缺少字段: {0}")]
  MissingField(&'static str),
  #[error("不支持的服务地址: {0}")]
  UnsupportedEndpoint(String),
}

/// 远程分析服务，文件所有权随请求一并交出
#[async_trait]
pub trait AnalysisService {
  async fn process(&self, file: CandidateFile) -> Result<ProcessedResult, ServiceError>;
}

#[async_trait]
impl<S: AnalysisService + Send + Sync + ?Sized> AnalysisService for std::sync::Arc<S> {
  async fn process(&self, file: CandidateFile) -> Result<ProcessedResult, ServiceError> {
    (**self).process(file).await
  }
}

/// 缺失字段的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
  /// 缺失字段取默认值
  #[default]
  Lenient,
  /// `vehicleCount` 与 `vehicleNumbers` 必须存在
  Strict,
}

/// 车辆检测汇总结果，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
  vehicle_count: u64,
  vehicle_numbers: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  processed_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultPayload {
  #[serde(default, alias = "vehicle_count")]
  vehicle_count: Option<u64>,
  #[serde(default, alias = "vehicle_numbers")]
  vehicle_numbers: Option<Vec<String>>,
  #[serde(default, alias = "processed_image_url")]
  processed_image_url: Option<String>,
  #[serde(default)]
  plates: Option<Vec<PlatePayload>>,
}

#[derive(Debug, Deserialize)]
struct PlatePayload {
  text: String,
}

impl ProcessedResult {
  pub fn new(
    vehicle_count: u64,
    vehicle_numbers: Vec<String>,
    processed_image_url: Option<String>,
  ) -> Self {
    Self {
      vehicle_count,
      vehicle_numbers,
      processed_image_url,
    }
  }

  pub fn vehicle_count(&self) -> u64 {
    self.vehicle_count
  }

  pub fn vehicle_numbers(&self) -> &[String] {
    &self.vehicle_numbers
  }

  pub fn processed_image_url(&self) -> Option<&str> {
    self.processed_image_url.as_deref()
  }

  /// 解析服务响应体，必须是 JSON 对象
  pub fn from_json_slice(body: &[u8], mode: ParseMode) -> Result<Self, ServiceError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
      return Err(ServiceError::NotAnObject);
    }
    let payload: ResultPayload = serde_json::from_value(value)?;

    // 旧版后端只返回 plates 数组
    let vehicle_numbers = payload.vehicle_numbers.or_else(|| {
      payload
        .plates
        .map(|plates| plates.into_iter().map(|plate| plate.text).collect())
    });

    if mode == ParseMode::Strict {
      if payload.vehicle_count.is_none() {
        return Err(ServiceError::MissingField("vehicleCount"));
      }
      if vehicle_numbers.is_none() {
        return Err(ServiceError::MissingField("vehicleNumbers"));
      }
    }

    Ok(Self {
      vehicle_count: payload.vehicle_count.unwrap_or_default(),
      vehicle_numbers: vehicle_numbers.unwrap_or_default(),
      processed_image_url: payload.processed_image_url,
    })
  }
}
