// 该文件是 Cheliu （车流） 项目的一部分。
// src/model/http_service.rs - 基于 HTTP 的远程分析服务
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
use reqwest::multipart::{Form, Part};
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl,
  candidate::CandidateFile,
  model::{AnalysisService, ParseMode, ProcessedResult, ServiceError},
};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/process";
pub const FILE_FIELD_NAME: &str = "file";
const USER_AGENT: &str = concat!("cheliu/", env!("CARGO_PKG_VERSION"));
const PING_PATH: &str = "ping";
const STRICT_FLAG: &str = "strict";

/// `http://host:port/api/process[?strict]`
///
/// 不设置客户端超时，失败只来自网络层或非 2xx 状态码。
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
  client: reqwest::Client,
  endpoint: Url,
  mode: ParseMode,
}

impl FromUrl for HttpAnalysisService {
  type Error = ServiceError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let (strict, rest): (Vec<_>, Vec<_>) = url
      .query_pairs()
      .into_owned()
      .partition(|(k, _)| k == STRICT_FLAG);
    let mode = if strict.is_empty() {
      ParseMode::Lenient
    } else {
      ParseMode::Strict
    };

    // 只去掉 strict，其余参数原样发给服务
    let mut endpoint = url.clone();
    if rest.is_empty() {
      endpoint.set_query(None);
    } else {
      endpoint.query_pairs_mut().clear().extend_pairs(rest);
    }

    Self::new(endpoint, mode)
  }
}

impl HttpAnalysisService {
  pub fn new(endpoint: Url, mode: ParseMode) -> Result<Self, ServiceError> {
    if !matches!(endpoint.scheme(), "http" | "https") {
      error!("不支持的服务地址: {}", endpoint);
      return Err(ServiceError::UnsupportedEndpoint(endpoint.to_string()));
    }

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    Ok(Self {
      client,
      endpoint,
      mode,
    })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  pub fn mode(&self) -> ParseMode {
    self.mode
  }

  /// 健康检查，`/api/process` 对应 `/api/ping`
  pub async fn ping(&self) -> Result<(), ServiceError> {
    let url = self
      .endpoint
      .join(PING_PATH)
      .map_err(|_| ServiceError::UnsupportedEndpoint(self.endpoint.to_string()))?;
    debug!("健康检查: {}", url);

    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(ServiceError::Status {
        status: status.as_u16(),
      });
    }
    Ok(())
  }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
  async fn process(&self, file: CandidateFile) -> Result<ProcessedResult, ServiceError> {
    let (name, mime_type, data) = file.into_parts();
    info!(
      "上传文件: {} ({}, {} 字节) -> {}",
      name,
      mime_type,
      data.len(),
      self.endpoint
    );

    let part = Part::bytes(data).file_name(name).mime_str(&mime_type)?;
    let form = Form::new().part(FILE_FIELD_NAME, part);

    let response = self
      .client
      .post(self.endpoint.clone())
      .multipart(form)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      error!("服务返回错误状态码: {}", status);
      return Err(ServiceError::Status {
        status: status.as_u16(),
      });
    }

    let body = response.bytes().await?;
    debug!("响应大小: {} 字节", body.len());
    ProcessedResult::from_json_slice(&body, self.mode)
  }
}
