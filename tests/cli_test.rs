//! # 命令行输出测试
//!
//! 日志走 stderr，stdout 只包含可解析的 JSON。

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::Value;

fn certdb(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_certdb"))
        .arg("--config")
        .arg(config)
        .args(["--log-level", "debug"])
        .args(args)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .get_output()
        .clone()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout 不是 JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn sqlite_config(dir: &Path) -> PathBuf {
    let config = dir.join("certdb.json");
    std::fs::write(
        &config,
        format!(
            r#"{{"engine": "sql", "driver": "sqlite3", "data_source": "{}"}}"#,
            dir.join("certdb.db").display()
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_ping_prints_json_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("kv.json");
    std::fs::write(&config, r#"{"engine": "kv", "uri": "memory://", "prefix": "cli"}"#).unwrap();

    let output = certdb(&config, &["ping"]);
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({ "backend": "kv", "ok": true })
    );
}

#[test]
fn test_listing_keeps_logs_off_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());

    let output = certdb(&config, &["unexpired-certs"]);
    assert_eq!(stdout_json(&output), serde_json::json!([]));
    // debug 级别下迁移与连接日志依然产生，只是写到 stderr
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_upsert_ocsp_stores_file_body() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(dir.path());
    let body_file = dir.path().join("resp.b64");
    std::fs::write(&body_file, " MIIB b64 \n").unwrap();

    let output = certdb(
        &config,
        &[
            "upsert-ocsp",
            "0a1b",
            "aki-1",
            "--body-file",
            body_file.to_str().unwrap(),
            "--expiry",
            "2999-01-01T00:00:00Z",
        ],
    );
    let record = stdout_json(&output);
    assert_eq!(record["body"], " MIIB b64 ");
    assert_eq!(record["serial"], "0a1b");

    let listed = stdout_json(&certdb(&config, &["unexpired-ocsps"]));
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}
