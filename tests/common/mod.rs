//! 集成测试共用工具

#![allow(dead_code)]

use std::ops::Deref;
use std::sync::Arc;

use certdb::config::{KvConfig, SqlConfig};
use certdb::{Accessor, AccessorConfig, CertificateRecord, OcspRecord, new_accessor};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use tempfile::TempDir;

/// 被测后端
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    MemoryKv,
    Sqlite,
}

/// 持有访问器及其临时目录，目录随测试结束删除
pub struct TestAccessor {
    accessor: Arc<dyn Accessor>,
    _dir: Option<TempDir>,
}

impl Deref for TestAccessor {
    type Target = Arc<dyn Accessor>;

    fn deref(&self) -> &Self::Target {
        &self.accessor
    }
}

pub async fn open(backend: Backend) -> TestAccessor {
    certdb::logging::init_optimized_logging(None);

    match backend {
        Backend::MemoryKv => TestAccessor {
            accessor: new_accessor(&AccessorConfig::Kv(KvConfig::memory("test")))
                .await
                .expect("创建内存访问器失败"),
            _dir: None,
        },
        Backend::Sqlite => {
            let dir = tempfile::tempdir().expect("创建临时目录失败");
            let path = dir.path().join("certdb.db");
            let config = SqlConfig {
                // 单连接避免 SQLite 写锁竞争
                max_connections: Some(1),
                ..SqlConfig::sqlite(path.to_string_lossy())
            };
            TestAccessor {
                accessor: new_accessor(&AccessorConfig::Sql(config))
                    .await
                    .expect("创建 SQLite 访问器失败"),
                _dir: Some(dir),
            }
        }
    }
}

/// 秒级精度的当前时间，避免不同后端的时间精度差异
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

pub fn certificate(serial: &str, aki: &str, expires_in: Duration) -> CertificateRecord {
    CertificateRecord::new(
        serial,
        aki,
        now() + expires_in,
        format!("-----BEGIN CERTIFICATE-----\n{serial}\n-----END CERTIFICATE-----"),
    )
}

pub fn ocsp(serial: &str, aki: &str, body: &str, expires_in: Duration) -> OcspRecord {
    OcspRecord::new(serial, aki, body, now() + expires_in)
}
