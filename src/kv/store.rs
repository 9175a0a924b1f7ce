//! # 文档存储抽象
//!
//! 带版本号的键值文档存储。读取返回不透明的 CAS 令牌，条件写入时原样交回；
//! 上层不解释令牌内容。

use async_trait::async_trait;

use crate::error::{RecordKind, Result};

/// 不透明的 CAS 令牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cas(u64);

impl Cas {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

/// 待写入的文档，附带供存储建立索引的类型与过期时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub doc_type: RecordKind,
    /// 过期时间（Unix 毫秒）
    pub expiry_millis: i64,
    /// 序列化后的文档
    pub body: String,
}

/// 读取结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedDocument {
    pub body: String,
    pub cas: Cas,
}

/// 插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Cas),
    /// 键已被占用
    Exists,
}

/// 条件替换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced(Cas),
    /// 令牌已过期（文档在读取后被修改或删除）
    Stale,
}

/// 版本化文档存储
///
/// 每个方法都必须在一次原子操作内完成检查与写入。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 读取文档及其 CAS 令牌
    async fn get(&self, key: &str) -> Result<Option<VersionedDocument>>;

    /// 仅当键不存在时写入
    async fn insert(&self, key: &str, doc: &StoredDocument) -> Result<InsertOutcome>;

    /// 仅当当前令牌等于 `cas` 时替换
    async fn replace(&self, key: &str, doc: &StoredDocument, cas: Cas) -> Result<ReplaceOutcome>;

    /// 返回类型为 `doc_type` 且过期时间不早于 `min_expiry_millis` 的所有文档。
    ///
    /// 实现应使用存储所能提供的最强一致性读取。
    async fn query_unexpired(&self, doc_type: RecordKind, min_expiry_millis: i64)
    -> Result<Vec<String>>;

    /// 连通性检查
    async fn ping(&self) -> Result<()>;

    /// 存储名称（用于日志）
    fn name(&self) -> &'static str;
}
