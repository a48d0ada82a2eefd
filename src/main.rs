// 该文件是 Cheliu （车流） 项目的一部分。
// src/main.rs - 单次上传主程序
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

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use cheliu::{
  FromUrl,
  input::{drop_entries, parse_source},
  intake::IntakeValidator,
  model::{DEFAULT_ENDPOINT, HttpAnalysisService},
  output::OutputWrapper,
  session::{DropOutcome, SubmitOutcome, UploadController},
  utils::init_tracing,
};

/// Cheliu 单次上传：只处理给出的第一个文件
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分析服务地址，加 `?strict` 要求响应字段完整
  #[arg(long, env = "CHELIU_ENDPOINT", default_value = DEFAULT_ENDPOINT, value_name = "URL")]
  pub endpoint: Url,
  /// 输出方式: term: / json: / folder:///path[?always]
  #[arg(long, env = "CHELIU_OUTPUT", default_value = "term:", value_name = "OUTPUT")]
  pub output: Url,
  /// 只检查服务是否可用
  #[arg(long)]
  pub ping: bool,
  /// 文件路径或 file:// URL，可给出多个，只取第一个
  #[arg(value_name = "FILE", value_parser = parse_source)]
  pub inputs: Vec<Url>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
  init_tracing();

  let args = Args::parse();

  info!("服务地址: {}", args.endpoint);
  info!("输出方式: {}", args.output);

  let service = HttpAnalysisService::from_url(&args.endpoint)?;
  if args.ping {
    service.ping().await?;
    info!("服务可用");
    return Ok(ExitCode::SUCCESS);
  }

  let entries = drop_entries(&args.inputs)?;
  let output = OutputWrapper::from_url(&args.output)?;
  let controller = UploadController::new(IntakeValidator::default(), service, output);

  let code = match controller.accept_drop(entries).await? {
    DropOutcome::Ignored(reason) => {
      info!("没有可处理的文件: {:?}", reason);
      ExitCode::SUCCESS
    }
    DropOutcome::Session { discarded, outcome } => {
      if discarded > 0 {
        info!("一次只处理一个文件，其余 {} 个未上传", discarded);
      }
      match outcome {
        SubmitOutcome::Failed { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
      }
    }
  };

  Ok(code)
}
