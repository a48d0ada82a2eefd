// 该文件是 Cheliu （车流） 项目的一部分。
// src/bin/cheliu_watch.rs - 持续接收拖放的上传程序
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

use anyhow::Result;
use clap::Parser;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use url::Url;

use cheliu::{
  FromUrl,
  input::{InputError, drop_entries, parse_source},
  intake::IntakeValidator,
  model::{DEFAULT_ENDPOINT, HttpAnalysisService},
  output::OutputWrapper,
  session::{DropOutcome, Rejection, SubmitOutcome, UploadController, UploadStatus},
  utils::init_tracing,
};

/// Cheliu 持续上传：标准输入每一行是一次拖放（空白分隔的路径或 URL）
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分析服务地址
  #[arg(long, env = "CHELIU_ENDPOINT", default_value = DEFAULT_ENDPOINT, value_name = "URL")]
  pub endpoint: Url,
  /// 输出方式
  #[arg(long, env = "CHELIU_OUTPUT", default_value = "term:", value_name = "OUTPUT")]
  pub output: Url,
  /// 完成指定数量的会话后退出
  #[arg(long, value_name = "COUNT")]
  pub max_sessions: Option<usize>,
}

fn parse_line(line: &str) -> Result<Vec<cheliu::candidate::RawFileEntry>, InputError> {
  let urls = line
    .split_whitespace()
    .map(parse_source)
    .collect::<Result<Vec<_>, _>>()?;
  drop_entries(&urls)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  init_tracing();

  let args = Args::parse();

  info!("服务地址: {}", args.endpoint);
  info!("输出方式: {}", args.output);

  let service = HttpAnalysisService::from_url(&args.endpoint)?;
  let output = OutputWrapper::from_url(&args.output)?;
  let controller = UploadController::new(IntakeValidator::default(), service, output);
  let mut status = controller.subscribe();

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut stdin_open = true;
  let mut inflight = FuturesUnordered::new();
  let mut completed = 0usize;

  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  info!("等待输入...");
  loop {
    tokio::select! {
      _ = &mut ctrl_c => {
        warn!("收到中断信号，退出");
        break;
      }
      line = lines.next_line(), if stdin_open => {
        match line? {
          Some(line) => match parse_line(&line) {
            Ok(entries) => inflight.push(controller.accept_drop(entries)),
            Err(err) => warn!("无效的输入: {}", err),
          },
          None => {
            debug!("标准输入已关闭");
            stdin_open = false;
          }
        }
      }
      Some(outcome) = inflight.next(), if !inflight.is_empty() => {
        match outcome? {
          DropOutcome::Session { outcome: SubmitOutcome::Rejected(Rejection::Busy), .. } => {
            info!("上一个文件仍在处理，忽略本次拖放");
          }
          DropOutcome::Session { discarded, .. } => {
            if discarded > 0 {
              info!("一次只处理一个文件，其余 {} 个未上传", discarded);
            }
            completed += 1;
          }
          DropOutcome::Ignored(reason) => debug!("忽略拖放: {:?}", reason),
        }
        if args.max_sessions.map(|n| completed >= n).unwrap_or(false) {
          info!("达到指定会话数 {}, 退出", completed);
          break;
        }
      }
      Ok(()) = status.changed() => {
        if status.borrow_and_update().status() == UploadStatus::Uploading {
          info!("Processing...");
        }
      }
    }

    if !stdin_open && inflight.is_empty() {
      break;
    }
  }

  info!("共完成 {} 个会话", completed);
  Ok(())
}
