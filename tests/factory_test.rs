//! # 配置与工厂测试

use std::io::Write;

use certdb::config::{KvEndpoint, SqlDriver};
use certdb::{AccessorConfig, BackendKind, ErrorKind, accessor_from_file};
use certdb::kv::KeyScheme;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_memory_kv_from_file() {
    let file = write_config(r#"{"engine": "kv", "uri": "memory://", "bucket": "certs"}"#);

    let accessor = accessor_from_file(file.path()).await.unwrap();
    assert_eq!(accessor.backend(), BackendKind::Kv);
    assert!(accessor.get_unexpired_ocsps().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sqlite_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("certdb.db");
    let file = write_config(&format!(
        r#"{{"engine": "sql", "driver": "sqlite3", "data_source": "{}", "max_connections": 2}}"#,
        db_path.display()
    ));

    let accessor = accessor_from_file(file.path()).await.unwrap();
    assert_eq!(accessor.backend(), BackendKind::Sql);
    accessor.ping().await.unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_kv_config_values() {
    let config = AccessorConfig::from_json_str(
        r#"{"engine": "kv", "uri": "redis://cache:6379/2", "prefix": "pki",
            "password": "s3cret", "key_scheme": "serial", "max_cas_retries": 8}"#,
    )
    .unwrap();

    let AccessorConfig::Kv(kv) = config else {
        panic!("应解析为 KV 配置");
    };
    assert_eq!(kv.namespace, "pki");
    assert_eq!(kv.key_scheme, KeyScheme::SerialOnly);
    assert_eq!(kv.max_cas_retries, 8);
    assert_eq!(kv.endpoint().unwrap(), KvEndpoint::Redis);
    assert_eq!(kv.redis_url().unwrap(), "redis://:s3cret@cache:6379/2");
}

#[test]
fn test_postgres_dsn_is_accepted() {
    let config = AccessorConfig::from_json_str(
        r#"{"engine": "sql", "driver": "postgres",
            "data_source": "host=db port=5432 user=ca password=pw dbname=certs sslmode=disable"}"#,
    )
    .unwrap();

    let AccessorConfig::Sql(sql) = config else {
        panic!("应解析为 SQL 配置");
    };
    assert_eq!(sql.driver, SqlDriver::Postgres);
    assert_eq!(
        sql.connection_url().unwrap(),
        "postgres://ca:pw@db:5432/certs?sslmode=disable"
    );
}

#[rstest]
#[case::unknown_engine(r#"{"engine": "couchbase"}"#)]
#[case::missing_engine(r#"{"uri": "memory://", "prefix": "x"}"#)]
#[case::kv_without_uri(r#"{"engine": "kv", "prefix": "x"}"#)]
#[case::kv_without_namespace(r#"{"engine": "kv", "uri": "memory://"}"#)]
#[case::kv_bad_scheme(r#"{"engine": "kv", "uri": "memcached://h", "prefix": "x"}"#)]
#[case::kv_zero_retries(r#"{"engine": "kv", "uri": "memory://", "prefix": "x", "max_cas_retries": 0}"#)]
#[case::sql_without_driver(r#"{"engine": "sql", "data_source": "x.db"}"#)]
#[case::sql_unknown_driver(r#"{"engine": "sql", "driver": "mysql", "data_source": "x"}"#)]
#[case::sql_without_source(r#"{"engine": "sql", "driver": "sqlite"}"#)]
#[case::nested_value(r#"{"engine": "kv", "uri": {"host": "h"}, "prefix": "x"}"#)]
fn test_invalid_configs_fail_with_configuration_error(#[case] content: &str) {
    let err = AccessorConfig::from_json_str(content).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration, "{content}: {err}");
}

#[tokio::test]
async fn test_missing_config_file() {
    let err = accessor_from_file("/nonexistent/certdb.json").await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
