//! # 内存文档存储
//!
//! 基于 `DashMap` 的进程内实现，语义与远程存储一致，用于测试和单进程部署。

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::store::{
    Cas, DocumentStore, InsertOutcome, ReplaceOutcome, StoredDocument, VersionedDocument,
};
use crate::error::{RecordKind, Result};

#[derive(Debug, Clone)]
struct MemoryEntry {
    body: String,
    doc_type: RecordKind,
    expiry_millis: i64,
    cas: u64,
}

/// 内存文档存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
    // 全局单调递增，保证同一个键先后得到的令牌不会重复
    next_cas: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn issue_cas(&self) -> u64 {
        self.next_cas.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 直接写入原始文档，绕过类型检查
    #[doc(hidden)]
    pub fn put_raw(&self, key: &str, doc_type: RecordKind, expiry_millis: i64, body: &str) {
        let cas = self.issue_cas();
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                body: body.to_string(),
                doc_type,
                expiry_millis,
                cas,
            },
        );
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedDocument>> {
        Ok(self.entries.get(key).map(|entry| VersionedDocument {
            body: entry.body.clone(),
            cas: Cas::from_raw(entry.cas),
        }))
    }

    async fn insert(&self, key: &str, doc: &StoredDocument) -> Result<InsertOutcome> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Exists),
            Entry::Vacant(vacant) => {
                let cas = self.issue_cas();
                vacant.insert(MemoryEntry {
                    body: doc.body.clone(),
                    doc_type: doc.doc_type,
                    expiry_millis: doc.expiry_millis,
                    cas,
                });
                Ok(InsertOutcome::Inserted(Cas::from_raw(cas)))
            }
        }
    }

    async fn replace(&self, key: &str, doc: &StoredDocument, cas: Cas) -> Result<ReplaceOutcome> {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(ReplaceOutcome::Stale);
        };
        if entry.cas != cas.into_raw() {
            return Ok(ReplaceOutcome::Stale);
        }

        let next = self.issue_cas();
        entry.body.clone_from(&doc.body);
        entry.doc_type = doc.doc_type;
        entry.expiry_millis = doc.expiry_millis;
        entry.cas = next;
        Ok(ReplaceOutcome::Replaced(Cas::from_raw(next)))
    }

    async fn query_unexpired(
        &self,
        doc_type: RecordKind,
        min_expiry_millis: i64,
    ) -> Result<Vec<String>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.doc_type == doc_type && entry.expiry_millis >= min_expiry_millis)
            .map(|entry| entry.body.clone())
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
