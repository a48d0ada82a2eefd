// 该文件是 Cheliu （车流） 项目的一部分。
// src/session.rs - 上传会话状态机
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

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
  candidate::{CandidateFile, RawFileEntry},
  intake::{IntakeOutcome, IntakeRejection, IntakeValidator},
  model::{AnalysisService, ProcessedResult, ServiceError},
  output::{FailureNotice, Render},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadStatus {
  #[default]
  Idle,
  Uploading,
  Succeeded,
  Failed,
}

impl fmt::Display for UploadStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UploadStatus::Idle => write!(f, "idle"),
      UploadStatus::Uploading => write!(f, "uploading"),
      UploadStatus::Succeeded => write!(f, "succeeded"),
      UploadStatus::Failed => write!(f, "failed"),
    }
  }
}

/// 失败原因，只用于日志与记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Read,
  Transport,
  Status(u16),
  MalformedResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
  kind: ErrorKind,
  message: String,
}

impl ErrorInfo {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    self.kind
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl From<&ServiceError> for ErrorInfo {
  fn from(err: &ServiceError) -> Self {
    let kind = match err {
      ServiceError::Transport(_) | ServiceError::UnsupportedEndpoint(_) => ErrorKind::Transport,
      ServiceError::Status { status } => ErrorKind::Status(*status),
      ServiceError::MalformedResponse(_)
      | ServiceError::NotAnObject
      | ServiceError::MissingField(_) => ErrorKind::MalformedResponse,
    };
    ErrorInfo::new(kind, err.to_string())
  }
}

impl From<&std::io::Error> for ErrorInfo {
  fn from(err: &std::io::Error) -> Self {
    ErrorInfo::new(ErrorKind::Read, err.to_string())
  }
}

/// 单次提交的状态快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSession {
  id: u64,
  status: UploadStatus,
  file_name: Option<String>,
  error: Option<ErrorInfo>,
}

impl UploadSession {
  /// 最近一次开始的会话编号，从 1 开始，0 表示尚未开始过
  pub fn id(&self) -> u64 {
    self.id
  }

  pub fn status(&self) -> UploadStatus {
    self.status
  }

  pub fn file_name(&self) -> Option<&str> {
    self.file_name.as_deref()
  }

  pub fn error(&self) -> Option<&ErrorInfo> {
    self.error.as_ref()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
  Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
  Succeeded { session: u64 },
  Failed { session: u64, error: ErrorInfo },
  Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
  /// 校验未通过，静默忽略
  Ignored(IntakeRejection),
  /// `discarded` 是同一次拖放中未被处理的其余条目数
  Session {
    outcome: SubmitOutcome,
    discarded: usize,
  },
}

/// 上传会话控制器
///
/// 同一时刻最多只有一个会话处于 `Uploading`。占用检查与状态切换在第一个挂起点之前
/// 同步完成，所以紧接着的第二次提交只会得到 `Rejected(Busy)`。
pub struct UploadController<S, O> {
  validator: IntakeValidator,
  service: S,
  output: O,
  session: watch::Sender<UploadSession>,
}

impl<S, O> UploadController<S, O>
where
  S: AnalysisService,
  O: Render,
{
  pub fn new(validator: IntakeValidator, service: S, output: O) -> Self {
    let (session, _) = watch::channel(UploadSession::default());
    Self {
      validator,
      service,
      output,
      session,
    }
  }

  pub fn service(&self) -> &S {
    &self.service
  }

  pub fn output(&self) -> &O {
    &self.output
  }

  pub fn status(&self) -> UploadStatus {
    self.session.borrow().status
  }

  pub fn session(&self) -> UploadSession {
    self.session.borrow().clone()
  }

  pub fn subscribe(&self) -> watch::Receiver<UploadSession> {
    self.session.subscribe()
  }

  /// 提交一个已接纳的文件
  pub async fn submit(&self, file: CandidateFile) -> Result<SubmitOutcome, O::Error> {
    let Some(id) = self.begin(file.name()) else {
      debug!("正在上传，忽略文件: {}", file.name());
      return Ok(SubmitOutcome::Rejected(Rejection::Busy));
    };

    let result = self.service.process(file).await;
    self.conclude(id, result.map_err(|err| ErrorInfo::from(&err)))
  }

  /// 处理一次拖放或文件选择
  pub async fn accept_drop<I>(&self, entries: I) -> Result<DropOutcome, O::Error>
  where
    I: IntoIterator<Item = RawFileEntry>,
  {
    let (entry, discarded) = match self.validator.admit(entries) {
      IntakeOutcome::Admitted {
        entry,
        category,
        discarded,
      } => {
        debug!(
          "接纳 {} 文件: {} (忽略其余 {} 个)",
          category.as_str(),
          entry.name(),
          discarded
        );
        (entry, discarded)
      }
      IntakeOutcome::Rejected(reason) => return Ok(DropOutcome::Ignored(reason)),
    };

    let Some(id) = self.begin(entry.name()) else {
      debug!("正在上传，忽略文件: {}", entry.name());
      return Ok(DropOutcome::Session {
        outcome: SubmitOutcome::Rejected(Rejection::Busy),
        discarded,
      });
    };

    let result = match entry.load().await {
      Ok(file) => self
        .service
        .process(file)
        .await
        .map_err(|err| ErrorInfo::from(&err)),
      Err(err) => Err(ErrorInfo::from(&err)),
    };
    self
      .conclude(id, result)
      .map(|outcome| DropOutcome::Session { outcome, discarded })
  }

  fn begin(&self, file_name: &str) -> Option<u64> {
    let mut started = None;
    self.session.send_if_modified(|session| {
      if session.status != UploadStatus::Idle {
        return false;
      }
      session.id += 1;
      session.status = UploadStatus::Uploading;
      session.file_name = Some(file_name.to_string());
      session.error = None;
      started = Some(session.id);
      true
    });

    if let Some(id) = started {
      info!("会话 {} 开始上传: {}", id, file_name);
    }
    started
  }

  fn conclude(
    &self,
    id: u64,
    result: Result<ProcessedResult, ErrorInfo>,
  ) -> Result<SubmitOutcome, O::Error> {
    let (outcome, rendered) = match result {
      Ok(result) => {
        info!(
          "会话 {} 处理完成: 检测到 {} 辆车",
          id,
          result.vehicle_count()
        );
        self.session.send_modify(|session| {
          session.status = UploadStatus::Succeeded;
        });
        let rendered = self.output.render_result(result);
        (SubmitOutcome::Succeeded { session: id }, rendered)
      }
      Err(error) => {
        warn!("会话 {} 处理失败: {}", id, error.message());
        let file_name = self.session.borrow().file_name.clone();
        self.session.send_modify(|session| {
          session.status = UploadStatus::Failed;
          session.error = Some(error.clone());
        });
        let notice = FailureNotice::new(id, file_name, error.clone());
        let rendered = self.output.render_failure(&notice);
        (SubmitOutcome::Failed { session: id, error }, rendered)
      }
    };

    // 无论展示是否成功都回到 Idle
    self.session.send_modify(|session| {
      session.status = UploadStatus::Idle;
      session.file_name = None;
      session.error = None;
    });
    rendered.map(|_| outcome)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use std::collections::VecDeque;
  use std::convert::Infallible;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};
  use tokio::sync::Notify;

  #[derive(Default)]
  struct ScriptedService {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<Result<ProcessedResult, ServiceError>>>,
    gate: Option<Arc<Notify>>,
  }

  impl ScriptedService {
    fn new(responses: Vec<Result<ProcessedResult, ServiceError>>) -> Self {
      Self {
        responses: Mutex::new(responses.into()),
        ..Default::default()
      }
    }

    fn gated(gate: Arc<Notify>, responses: Vec<Result<ProcessedResult, ServiceError>>) -> Self {
      Self {
        gate: Some(gate),
        ..Self::new(responses)
      }
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<String> {
      self.seen.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl AnalysisService for ScriptedService {
    async fn process(&self, file: CandidateFile) -> Result<ProcessedResult, ServiceError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.seen.lock().unwrap().push(file.name().to_string());
      if let Some(gate) = &self.gate {
        gate.notified().await;
      }
      let next = self.responses.lock().unwrap().pop_front();
      next.unwrap_or(Err(ServiceError::Status { status: 500 }))
    }
  }

  #[derive(Default)]
  struct Recorder {
    results: Mutex<Vec<ProcessedResult>>,
    failures: Mutex<Vec<FailureNotice>>,
  }

  impl Render for Recorder {
    type Error = Infallible;

    fn render_result(&self, result: ProcessedResult) -> Result<(), Self::Error> {
      self.results.lock().unwrap().push(result);
      Ok(())
    }

    fn render_failure(&self, notice: &FailureNotice) -> Result<(), Self::Error> {
      self.failures.lock().unwrap().push(notice.clone());
      Ok(())
    }
  }

  struct BrokenOutput;

  impl Render for BrokenOutput {
    type Error = std::io::Error;

    fn render_result(&self, _: ProcessedResult) -> Result<(), Self::Error> {
      Err(std::io::Error::other("显示失败"))
    }

    fn render_failure(&self, _: &FailureNotice) -> Result<(), Self::Error> {
      Err(std::io::Error::other("显示失败"))
    }
  }

  fn plates() -> ProcessedResult {
    ProcessedResult::new(
      3,
      vec!["AB12CD3456".into(), "XY98ZZ0001".into(), "MH04AB1234".into()],
      None,
    )
  }

  fn file(name: &str) -> CandidateFile {
    CandidateFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
  }

  fn entry(name: &str) -> RawFileEntry {
    RawFileEntry::in_memory(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
  }

  fn controller(service: ScriptedService) -> UploadController<ScriptedService, Recorder> {
    UploadController::new(IntakeValidator::default(), service, Recorder::default())
  }

  #[tokio::test]
  async fn empty_drop_leaves_controller_idle() {
    let controller = controller(ScriptedService::new(vec![]));
    let outcome = controller.accept_drop(Vec::new()).await.unwrap();

    assert_eq!(outcome, DropOutcome::Ignored(IntakeRejection::Empty));
    assert_eq!(controller.session(), UploadSession::default());
    assert_eq!(controller.service().calls(), 0);
  }

  #[tokio::test]
  async fn only_first_entry_of_a_drop_is_uploaded() {
    let controller = controller(ScriptedService::new(vec![Ok(plates())]));
    let outcome = controller
      .accept_drop(vec![entry("first.jpg"), entry("second.png"), entry("third.mp4")])
      .await
      .unwrap();

    assert_eq!(
      outcome,
      DropOutcome::Session {
        outcome: SubmitOutcome::Succeeded { session: 1 },
        discarded: 2,
      }
    );
    assert_eq!(controller.service().seen(), ["first.jpg"]);
  }

  #[tokio::test]
  async fn unsupported_file_never_reaches_service() {
    let controller = controller(ScriptedService::new(vec![Ok(plates())]));
    for name in ["notes.txt", "manual.pdf", "setup.exe"] {
      let outcome = controller.accept_drop(vec![entry(name)]).await.unwrap();
      assert!(matches!(
        outcome,
        DropOutcome::Ignored(IntakeRejection::UnsupportedType { .. })
      ));
    }
    assert_eq!(controller.service().calls(), 0);
    assert_eq!(controller.status(), UploadStatus::Idle);
  }

  #[tokio::test]
  async fn second_submit_while_uploading_is_dropped() {
    let gate = Arc::new(Notify::new());
    let controller = controller(ScriptedService::gated(gate.clone(), vec![Ok(plates())]));

    let first = controller.submit(file("first.jpg"));
    tokio::pin!(first);
    assert!(futures::poll!(first.as_mut()).is_pending());
    assert_eq!(controller.status(), UploadStatus::Uploading);

    let second = controller.submit(file("second.jpg")).await.unwrap();
    assert_eq!(second, SubmitOutcome::Rejected(Rejection::Busy));
    let drop = controller.accept_drop(vec![entry("third.jpg")]).await.unwrap();
    assert_eq!(
      drop,
      DropOutcome::Session {
        outcome: SubmitOutcome::Rejected(Rejection::Busy),
        discarded: 0,
      }
    );

    let session = controller.session();
    assert_eq!(session.status(), UploadStatus::Uploading);
    assert_eq!(session.file_name(), Some("first.jpg"));

    gate.notify_one();
    let outcome = first.await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Succeeded { session: 1 });
    assert_eq!(controller.service().calls(), 1);
    assert_eq!(controller.service().seen(), ["first.jpg"]);
    assert_eq!(controller.status(), UploadStatus::Idle);
  }

  #[tokio::test]
  async fn success_hands_result_to_output_and_returns_to_idle() {
    let controller = controller(ScriptedService::new(vec![Ok(plates())]));
    let outcome = controller.submit(file("street.jpg")).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Succeeded { session: 1 });
    let results = controller.output().results.lock().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].vehicle_count(), 3);
    assert_eq!(
      results[0].vehicle_numbers(),
      ["AB12CD3456", "XY98ZZ0001", "MH04AB1234"]
    );
    assert!(controller.output().failures.lock().unwrap().is_empty());
    assert_eq!(controller.status(), UploadStatus::Idle);
  }

  #[tokio::test]
  async fn server_error_emits_failure_and_returns_to_idle() {
    let controller = controller(ScriptedService::new(vec![Err(ServiceError::Status {
      status: 500,
    })]));
    let outcome = controller.submit(file("street.jpg")).await.unwrap();

    match outcome {
      SubmitOutcome::Failed { session, error } => {
        assert_eq!(session, 1);
        assert_eq!(error.kind(), ErrorKind::Status(500));
      }
      other => panic!("意外结果: {:?}", other),
    }
    let failures = controller.output().failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].file_name(), Some("street.jpg"));
    assert!(controller.output().results.lock().unwrap().is_empty());
    assert_eq!(controller.status(), UploadStatus::Idle);
  }

  #[tokio::test]
  async fn malformed_response_is_reported_like_any_failure() {
    let controller = controller(ScriptedService::new(vec![Err(ServiceError::NotAnObject)]));
    let outcome = controller.submit(file("street.jpg")).await.unwrap();
    assert!(matches!(
      outcome,
      SubmitOutcome::Failed { ref error, .. } if error.kind() == ErrorKind::MalformedResponse
    ));
    assert_eq!(controller.output().failures.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn new_session_after_failure_is_independent() {
    let controller = controller(ScriptedService::new(vec![
      Err(ServiceError::Status { status: 502 }),
      Ok(ProcessedResult::new(1, vec!["KA01AB1234".into()], None)),
    ]));

    controller.submit(file("broken.jpg")).await.unwrap();
    let outcome = controller.submit(file("fresh.png")).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Succeeded { session: 2 });
    let results = controller.output().results.lock().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].vehicle_numbers(), ["KA01AB1234"]);
    assert_eq!(controller.output().failures.lock().unwrap().len(), 1);

    let session = controller.session();
    assert_eq!(session.id(), 2);
    assert_eq!(session.status(), UploadStatus::Idle);
    assert!(session.error().is_none());
  }

  #[tokio::test]
  async fn unreadable_file_fails_the_session() {
    let controller = controller(ScriptedService::new(vec![Ok(plates())]));
    let missing = RawFileEntry::from_path("/nonexistent/cheliu/street.jpg").unwrap();
    let outcome = controller.accept_drop(vec![missing]).await.unwrap();

    match outcome {
      DropOutcome::Session {
        outcome: SubmitOutcome::Failed { error, .. },
        ..
      } => {
        assert_eq!(error.kind(), ErrorKind::Read)
      }
      other => panic!("意外结果: {:?}", other),
    }
    assert_eq!(controller.service().calls(), 0);
    assert_eq!(controller.output().failures.lock().unwrap().len(), 1);
    assert_eq!(controller.status(), UploadStatus::Idle);
  }

  #[tokio::test]
  async fn output_error_still_returns_to_idle() {
    let controller = UploadController::new(
      IntakeValidator::default(),
      ScriptedService::new(vec![Ok(plates())]),
      BrokenOutput,
    );
    assert!(controller.submit(file("street.jpg")).await.is_err());
    assert_eq!(controller.status(), UploadStatus::Idle);

    assert!(controller.submit(file("street.jpg")).await.is_err());
    assert_eq!(controller.session().id(), 2);
  }

  #[tokio::test]
  async fn subscribers_see_uploading() {
    let gate = Arc::new(Notify::new());
    let controller = controller(ScriptedService::gated(gate.clone(), vec![Ok(plates())]));
    let mut status = controller.subscribe();

    let pending = controller.submit(file("street.jpg"));
    tokio::pin!(pending);
    assert!(futures::poll!(pending.as_mut()).is_pending());

    assert!(status.has_changed().unwrap());
    assert_eq!(status.borrow_and_update().status(), UploadStatus::Uploading);

    gate.notify_one();
    pending.await.unwrap();
    assert_eq!(status.borrow_and_update().status(), UploadStatus::Idle);
  }
}
