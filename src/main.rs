//! # certdb 命令行工具
//!
//! 对访问接口的薄封装，用于运维排查：查询、吊销证书，查看与刷新 OCSP 响应。
//! 结果以 JSON 输出到标准输出。

use std::path::PathBuf;

use anyhow::Context as _;
use certdb::{
    AccessorConfig, CrlReason,
    config::{CONFIG_ENV_VAR, config_path_from_env},
    database, lerror, linfo,
    logging::{self, LogComponent, LogStage},
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "certdb", version, about = "证书与 OCSP 响应存储工具")]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// JSON 配置文件路径
    #[clap(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// 日志级别
    #[clap(long)]
    log_level: Option<String>,
}

#[derive(Clone, Subcommand)]
enum Command {
    /// 检查存储连通性
    Ping,
    /// 执行数据库迁移（仅 SQL 后端）
    Migrate,
    /// 查询证书
    #[command(name = "get-cert")]
    GetCert { serial: String, aki: String },
    /// 吊销证书
    Revoke {
        serial: String,
        aki: String,
        /// 吊销原因（数字或名称，例如 1 或 keyCompromise）
        #[clap(long, default_value = "unspecified")]
        reason: CrlReason,
    },
    /// 列出未过期证书
    #[command(name = "unexpired-certs")]
    UnexpiredCerts,
    /// 查询 OCSP 响应
    #[command(name = "get-ocsp")]
    GetOcsp { serial: String, aki: String },
    /// 列出未过期 OCSP 响应
    #[command(name = "unexpired-ocsps")]
    UnexpiredOcsps,
    /// 写入或刷新 OCSP 响应
    #[command(name = "upsert-ocsp")]
    UpsertOcsp {
        serial: String,
        aki: String,
        /// 响应内容文件
        #[clap(long)]
        body_file: PathBuf,
        /// 过期时间（RFC 3339）
        #[clap(long)]
        expiry: DateTime<Utc>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_optimized_logging(args.log_level.as_ref());

    if let Err(e) = run(args).await {
        lerror!(
            "system",
            LogStage::Error,
            LogComponent::Main,
            "command_failed",
            &format!("命令执行失败: {e:#}")
        );
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let path = args
        .config
        .or_else(config_path_from_env)
        .with_context(|| format!("需要通过 --config 或 {CONFIG_ENV_VAR} 指定配置文件"))?;
    let config = AccessorConfig::from_file(&path)?;

    if let Command::Migrate = args.command {
        return migrate(&config).await;
    }
    let accessor = certdb::new_accessor(&config).await?;

    match args.command {
        Command::Ping => {
            accessor.ping().await?;
            print_json(&serde_json::json!({ "backend": accessor.backend().as_str(), "ok": true }))
        }
        Command::Migrate => migrate(&config).await,
        Command::GetCert { serial, aki } => {
            print_json(&accessor.get_certificate(&serial, &aki).await?)
        }
        Command::Revoke {
            serial,
            aki,
            reason,
        } => {
            accessor
                .revoke_certificate(&serial, &aki, reason.code())
                .await?;
            linfo!(
                "system",
                LogStage::Mutation,
                LogComponent::Main,
                "revoke",
                &format!("已吊销: serial={serial}, reason={}", reason.code())
            );
            print_json(&accessor.get_certificate(&serial, &aki).await?)
        }
        Command::UnexpiredCerts => print_json(&accessor.get_unexpired_certificates().await?),
        Command::GetOcsp { serial, aki } => print_json(&accessor.get_ocsp(&serial, &aki).await?),
        Command::UnexpiredOcsps => print_json(&accessor.get_unexpired_ocsps().await?),
        Command::UpsertOcsp {
            serial,
            aki,
            body_file,
            expiry,
        } => {
            let body = std::fs::read_to_string(&body_file)
                .with_context(|| format!("读取响应文件失败: {}", body_file.display()))?;
            accessor
                .upsert_ocsp(&serial, &aki, strip_trailing_newline(&body), expiry)
                .await?;
            print_json(&accessor.get_ocsp(&serial, &aki).await?)
        }
    }
}

async fn migrate(config: &AccessorConfig) -> anyhow::Result<()> {
    let AccessorConfig::Sql(sql) = config else {
        anyhow::bail!("migrate 仅适用于 SQL 后端");
    };

    let db = database::init_database(sql).await?;
    database::run_migrations(&db).await?;
    let pending = database::check_database_status(&db).await?;
    print_json(&serde_json::json!({ "pending_migrations": pending }))
}

/// 去掉文件末尾的单个换行（`\n` 或 `\r\n`），其余内容原样保留
fn strip_trailing_newline(body: &str) -> &str {
    body.strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trailing_newline_keeps_body_intact() {
        assert_eq!(strip_trailing_newline("b64body\n"), "b64body");
        assert_eq!(strip_trailing_newline("b64body\r\n"), "b64body");
        assert_eq!(strip_trailing_newline("b64body\n\n"), "b64body\n");
        assert_eq!(strip_trailing_newline("  b64 body \t"), "  b64 body \t");
        assert_eq!(strip_trailing_newline(""), "");
    }
}
