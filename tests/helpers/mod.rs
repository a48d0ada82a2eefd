// 该文件是 Cheliu （车流） 项目的一部分。
// tests/helpers/mod.rs - 集成测试用的模拟分析服务
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

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{
  Router,
  extract::{Multipart, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use tokio::sync::Notify;
use url::Url;

/// 服务端收到的一个 multipart 字段
#[derive(Debug, Clone)]
pub struct ReceivedPart {
  pub field: Option<String>,
  pub file_name: Option<String>,
  pub content_type: Option<String>,
  pub data: Vec<u8>,
}

/// 预先排好的响应：状态码与响应体
#[derive(Debug, Clone)]
pub struct Reply {
  pub status: StatusCode,
  pub body: String,
}

impl Reply {
  pub fn json(body: &str) -> Self {
    Self {
      status: StatusCode::OK,
      body: body.to_string(),
    }
  }

  pub fn status(status: StatusCode) -> Self {
    Self {
      status,
      body: r#"{"detail": "Analysis failed"}"#.to_string(),
    }
  }
}

#[derive(Default)]
pub struct FakeServiceState {
  pub requests: Mutex<Vec<Vec<ReceivedPart>>>,
  pub replies: Mutex<VecDeque<Reply>>,
  pub gate: Option<Arc<Notify>>,
}

impl FakeServiceState {
  pub fn request_count(&self) -> usize {
    self.requests.lock().unwrap().len()
  }

  pub fn requests(&self) -> Vec<Vec<ReceivedPart>> {
    self.requests.lock().unwrap().clone()
  }
}

pub struct FakeService {
  pub endpoint: Url,
  pub state: Arc<FakeServiceState>,
}

async fn process(State(state): State<Arc<FakeServiceState>>, mut multipart: Multipart) -> Response {
  let mut parts = Vec::new();
  while let Ok(Some(field)) = multipart.next_field().await {
    let field_name = field.name().map(str::to_string);
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
    parts.push(ReceivedPart {
      field: field_name,
      file_name,
      content_type,
      data,
    });
  }
  state.requests.lock().unwrap().push(parts);

  if let Some(gate) = &state.gate {
    gate.notified().await;
  }

  let reply = state.replies.lock().unwrap().pop_front();
  let reply = reply.unwrap_or_else(|| Reply::status(StatusCode::INTERNAL_SERVER_ERROR));
  (
    reply.status,
    [("content-type", "application/json")],
    reply.body,
  )
    .into_response()
}

async fn ping() -> &'static str {
  r#"{"status": "ok"}"#
}

impl FakeService {
  pub async fn start(replies: Vec<Reply>) -> Self {
    Self::start_with(FakeServiceState {
      replies: Mutex::new(replies.into()),
      ..Default::default()
    })
    .await
  }

  pub async fn start_gated(gate: Arc<Notify>, replies: Vec<Reply>) -> Self {
    Self::start_with(FakeServiceState {
      replies: Mutex::new(replies.into()),
      gate: Some(gate),
      ..Default::default()
    })
    .await
  }

  async fn start_with(state: FakeServiceState) -> Self {
    let state = Arc::new(state);
    let app = Router::new()
      .route("/api/process", post(process))
      .route("/api/ping", get(ping))
      .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    Self {
      endpoint: Url::parse(&format!("http://{}/api/process", addr)).unwrap(),
      state,
    }
  }

  pub fn endpoint_with_query(&self, query: &str) -> Url {
    let mut url = self.endpoint.clone();
    url.set_query(Some(query));
    url
  }
}

/// 一个已关闭端口的地址，连接必然失败
pub async fn unreachable_endpoint() -> Url {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  Url::parse(&format!("http://{}/api/process", addr)).unwrap()
}

pub const THREE_PLATES: &str =
  r#"{"vehicleCount": 3, "vehicleNumbers": ["AB12CD3456","XY98ZZ0001","MH04AB1234"]}"#;
