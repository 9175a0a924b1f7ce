//! # 键值存储访问器
//!
//! 读-改-写全部走 CAS：读取文档与令牌，在本地修改，再带令牌条件写回。
//! 令牌过期说明期间有并发写入，重新读取后重试，超过上限返回 `Conflict`。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::document::{KvRecord, decode, encode};
use super::keys::KeyBuilder;
use super::store::{Cas, DocumentStore, InsertOutcome, ReplaceOutcome};
use crate::accessor::{Accessor, BackendKind};
use crate::config::{DEFAULT_MAX_CAS_RETRIES, KvConfig};
use crate::error::{CertDbError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::record::{CertificateRecord, OcspRecord};
use crate::{ldebug, lwarn};

/// 基于 [`DocumentStore`] 的访问器
pub struct KvAccessor<S> {
    store: S,
    keys: KeyBuilder,
    max_cas_retries: u32,
}

impl<S: DocumentStore> KvAccessor<S> {
    pub fn new(store: S, keys: KeyBuilder) -> Self {
        Self {
            store,
            keys,
            max_cas_retries: DEFAULT_MAX_CAS_RETRIES,
        }
    }

    pub fn from_config(store: S, config: &KvConfig) -> Self {
        Self::new(store, KeyBuilder::new(&config.namespace, config.key_scheme))
            .with_max_cas_retries(config.max_cas_retries)
    }

    /// 设置 CAS 最大尝试次数（至少一次）
    #[must_use]
    pub fn with_max_cas_retries(mut self, max_cas_retries: u32) -> Self {
        self.max_cas_retries = max_cas_retries.max(1);
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 读取并校验主键。旧版键方案下同一序列号的其他 AKI 文档视为不存在。
    async fn load<T: KvRecord>(
        &self,
        key: &str,
        serial: &str,
        aki: &str,
    ) -> Result<Option<(T, Cas)>> {
        let Some(versioned) = self.store.get(key).await? else {
            return Ok(None);
        };
        let record: T = decode(key, &versioned.body)?;

        if record.matches_key(serial, aki) {
            Ok(Some((record, versioned.cas)))
        } else {
            ldebug!(
                "system",
                LogStage::Query,
                LogComponent::Accessor,
                "key_mismatch",
                &format!(
                    "文档主键不匹配: key={key}, 请求 aki={aki}, 实际 aki={}",
                    record.authority_key_identifier()
                )
            );
            Ok(None)
        }
    }

    async fn insert_record<T: KvRecord>(&self, record: &T) -> Result<()> {
        let key = self
            .keys
            .document(T::KIND, record.serial(), record.authority_key_identifier());
        let doc = encode(record)?;

        match self.store.insert(&key, &doc).await? {
            InsertOutcome::Inserted(_) => {
                ldebug!(
                    "system",
                    LogStage::Mutation,
                    LogComponent::Accessor,
                    "insert_record",
                    &format!("写入 {}: key={key}", T::KIND)
                );
                Ok(())
            }
            InsertOutcome::Exists => Err(CertDbError::duplicate_key(
                T::KIND,
                record.serial(),
                record.authority_key_identifier(),
            )),
        }
    }

    async fn get_record<T: KvRecord>(&self, serial: &str, aki: &str) -> Result<Vec<T>> {
        let key = self.keys.document(T::KIND, serial, aki);
        Ok(self
            .load::<T>(&key, serial, aki)
            .await?
            .map(|(record, _)| record)
            .into_iter()
            .collect())
    }

    async fn scan_unexpired<T: KvRecord>(&self) -> Result<Vec<T>> {
        let now = Utc::now();
        // 索引精度为毫秒，先按毫秒下界取回，再按完整精度严格过滤
        let bodies = self
            .store
            .query_unexpired(T::KIND, now.timestamp_millis())
            .await?;

        let mut records = Vec::with_capacity(bodies.len());
        for body in bodies {
            let record: T = decode(T::KIND.as_str(), &body)?;
            if KvRecord::is_unexpired_at(&record, now) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// 对已存在的文档执行 CAS 读-改-写
    async fn modify<T, F>(&self, serial: &str, aki: &str, mutate: F) -> Result<()>
    where
        T: KvRecord,
        F: Fn(&mut T) -> Result<()> + Send + Sync,
    {
        let key = self.keys.document(T::KIND, serial, aki);

        for attempt in 1..=self.max_cas_retries {
            let Some((mut record, cas)) = self.load::<T>(&key, serial, aki).await? else {
                return Err(CertDbError::not_found(T::KIND, serial, aki));
            };
            mutate(&mut record)?;
            let doc = encode(&record)?;

            match self.store.replace(&key, &doc, cas).await? {
                ReplaceOutcome::Replaced(_) => return Ok(()),
                ReplaceOutcome::Stale => self.log_retry(&key, attempt),
            }
        }

        Err(CertDbError::conflict(key, self.max_cas_retries))
    }

    fn log_retry(&self, key: &str, attempt: u32) {
        lwarn!(
            "system",
            LogStage::Retry,
            LogComponent::Accessor,
            "cas_conflict",
            &format!("CAS 冲突，重新读取: key={key}, attempt={attempt}/{}", self.max_cas_retries),
            store = self.store.name()
        );
    }
}

#[async_trait]
impl<S: DocumentStore> Accessor for KvAccessor<S> {
    async fn insert_certificate(&self, record: &CertificateRecord) -> Result<()> {
        record.validate()?;
        self.insert_record(record).await
    }

    async fn get_certificate(&self, serial: &str, aki: &str) -> Result<Vec<CertificateRecord>> {
        self.get_record(serial, aki).await
    }

    async fn get_unexpired_certificates(&self) -> Result<Vec<CertificateRecord>> {
        self.scan_unexpired().await
    }

    async fn revoke_certificate(&self, serial: &str, aki: &str, reason_code: i32) -> Result<()> {
        self.modify::<CertificateRecord, _>(serial, aki, |record| {
            record.revoke(reason_code, Utc::now());
            Ok(())
        })
        .await
    }

    async fn insert_ocsp(&self, record: &OcspRecord) -> Result<()> {
        record.validate()?;
        self.insert_record(record).await
    }

    async fn get_ocsp(&self, serial: &str, aki: &str) -> Result<Vec<OcspRecord>> {
        self.get_record(serial, aki).await
    }

    async fn get_unexpired_ocsps(&self) -> Result<Vec<OcspRecord>> {
        self.scan_unexpired().await
    }

    async fn update_ocsp(
        &self,
        serial: &str,
        aki: &str,
        body: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        // 先校验入参，避免空主键被当作不存在处理
        OcspRecord::new(serial, aki, body, expiry).validate()?;

        self.modify::<OcspRecord, _>(serial, aki, |record| {
            record.refresh(body, expiry);
            record.validate()
        })
        .await
    }

    async fn upsert_ocsp(
        &self,
        serial: &str,
        aki: &str,
        body: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        OcspRecord::new(serial, aki, body, expiry).validate()?;
        let key = self.keys.document(OcspRecord::KIND, serial, aki);

        for attempt in 1..=self.max_cas_retries {
            match self.store.get(&key).await? {
                Some(versioned) => {
                    let mut record: OcspRecord = decode(&key, &versioned.body)?;
                    // 旧版键方案下该键属于另一 AKI，不能覆盖
                    if !record.matches_key(serial, aki) {
                        return Err(CertDbError::duplicate_key(OcspRecord::KIND, serial, aki));
                    }
                    record.refresh(body, expiry);
                    record.validate()?;

                    match self.store.replace(&key, &encode(&record)?, versioned.cas).await? {
                        ReplaceOutcome::Replaced(_) => return Ok(()),
                        ReplaceOutcome::Stale => self.log_retry(&key, attempt),
                    }
                }
                None => {
                    let record = OcspRecord::new(serial, aki, body, expiry);
                    record.validate()?;

                    match self.store.insert(&key, &encode(&record)?).await? {
                        InsertOutcome::Inserted(_) => return Ok(()),
                        // 并发创建抢先一步，转为替换
                        InsertOutcome::Exists => self.log_retry(&key, attempt),
                    }
                }
            }
        }

        Err(CertDbError::conflict(key, self.max_cas_retries))
    }

    async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Kv
    }
}
