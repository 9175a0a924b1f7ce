//! # certdb
//!
//! 证书与 OCSP 响应的持久化访问层。签发服务写入证书、吊销证书；OCSP 响应服务
//! 读取与刷新缓存的响应。同一套 [`Accessor`] 契约由两种后端实现：
//!
//! - [`kv`]：带 CAS 令牌的键值文档存储（Redis 或进程内存）
//! - [`sql`]：Sea-ORM 关系型数据库（SQLite 或 PostgreSQL）

pub mod accessor;
pub mod config;
pub mod database;
pub mod error;
pub mod factory;
pub mod kv;
pub mod logging;
pub mod record;
pub mod sql;

// Re-export commonly used types
pub use accessor::{Accessor, BackendKind};
pub use config::AccessorConfig;
pub use error::{CertDbError, ErrorKind, RecordKind, Result};
pub use factory::{accessor_from_file, new_accessor};
pub use record::{CertificateRecord, CertificateStatus, CrlReason, OcspRecord};
