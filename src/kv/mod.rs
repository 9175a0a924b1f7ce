//! # 键值存储后端
//!
//! - [`DocumentStore`]：带 CAS 令牌的文档存储抽象
//! - [`MemoryStore`] / [`RedisStore`]：具体实现
//! - [`KvAccessor`]：在文档存储之上实现 [`crate::Accessor`]

mod accessor;
mod document;
mod keys;
mod memory_store;
mod redis_store;
mod store;

pub use accessor::KvAccessor;
pub use document::KvRecord;
pub use keys::{KeyBuilder, KeyScheme, expiry_index_key};
pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{
    Cas, DocumentStore, InsertOutcome, ReplaceOutcome, StoredDocument, VersionedDocument,
};
