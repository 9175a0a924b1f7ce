//! # 访问接口
//!
//! 所有存储后端必须满足的统一契约。调用方（签发服务、OCSP 响应服务）
//! 在启动时通过 [`crate::factory`] 获取一个 `Arc<dyn Accessor>`，之后只与该接口交互。

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::record::{CertificateRecord, OcspRecord};

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// 键值文档存储（CAS 乐观并发）
    Kv,
    /// 关系型数据库（行级事务）
    Sql,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kv => "kv",
            Self::Sql => "sql",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 证书与 OCSP 响应的存取契约
///
/// 不同键上的操作可以并发调用；同一键上的读-改-写由各后端的并发原语保证原子性
/// （KV 为 CAS 令牌，SQL 为单行 UPDATE）。
#[async_trait]
pub trait Accessor: Send + Sync {
    /// 写入新证书。键已存在时返回 `DuplicateKey`。
    async fn insert_certificate(&self, record: &CertificateRecord) -> Result<()>;

    /// 按复合主键查询证书。不存在时返回空列表，不视为错误。
    async fn get_certificate(&self, serial: &str, aki: &str) -> Result<Vec<CertificateRecord>>;

    /// 所有 `expiry` 严格晚于当前时间的证书，顺序不保证。
    async fn get_unexpired_certificates(&self) -> Result<Vec<CertificateRecord>>;

    /// 吊销证书。不存在时返回 `NotFound`；重复吊销覆盖原因码与时间。
    async fn revoke_certificate(&self, serial: &str, aki: &str, reason_code: i32) -> Result<()>;

    /// 写入新的 OCSP 响应。键已存在时返回 `DuplicateKey`。
    async fn insert_ocsp(&self, record: &OcspRecord) -> Result<()>;

    /// 按复合主键查询 OCSP 响应。不存在时返回空列表。
    async fn get_ocsp(&self, serial: &str, aki: &str) -> Result<Vec<OcspRecord>>;

    /// 所有 `expiry` 严格晚于当前时间的 OCSP 响应。
    async fn get_unexpired_ocsps(&self) -> Result<Vec<OcspRecord>>;

    /// 替换已有 OCSP 响应的内容与过期时间。不存在时返回 `NotFound`。
    async fn update_ocsp(
        &self,
        serial: &str,
        aki: &str,
        body: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()>;

    /// 存在则替换，不存在则创建。
    async fn upsert_ocsp(
        &self,
        serial: &str,
        aki: &str,
        body: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()>;

    /// 测试与底层存储的连通性
    async fn ping(&self) -> Result<()>;

    /// 后端类型
    fn backend(&self) -> BackendKind;
}
