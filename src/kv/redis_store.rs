//! # Redis 文档存储
//!
//! 每个文档是一个 hash（`doc` 为正文，`cas` 为版本号），另以有序集合
//! `{namespace}:expiry:{type}` 按过期毫秒数建立索引。检查与写入都放在 Lua 脚本里
//! 原子执行；未过期查询也在单个脚本内完成，得到时间点一致的结果。
//!
//! 查询脚本会读取索引成员对应的文档键，这些键没有在 `KEYS` 中声明，
//! 因此只支持单节点或主从部署，不支持 Redis Cluster。文档被外部删除后，
//! 其索引成员在下一次查询时移除；已过期但仍存在的文档保留索引成员。

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};

use super::keys::expiry_index_key;
use super::store::{
    Cas, DocumentStore, InsertOutcome, ReplaceOutcome, StoredDocument, VersionedDocument,
};
use crate::backend_error;
use crate::error::{CertDbError, RecordKind, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lerror, linfo};

const INSERT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return -1
end
redis.call('HSET', KEYS[1], 'doc', ARGV[1], 'cas', 1)
redis.call('ZADD', KEYS[2], ARGV[2], KEYS[1])
return 1
";

const REPLACE_SCRIPT: &str = r"
local current = redis.call('HGET', KEYS[1], 'cas')
if not current or current ~= ARGV[3] then
  return -1
end
local next = redis.call('HINCRBY', KEYS[1], 'cas', 1)
redis.call('HSET', KEYS[1], 'doc', ARGV[1])
redis.call('ZADD', KEYS[2], ARGV[2], KEYS[1])
return next
";

const QUERY_SCRIPT: &str = r"
local keys = redis.call('ZRANGEBYSCORE', KEYS[1], ARGV[1], '+inf')
local docs = {}
for _, key in ipairs(keys) do
  local doc = redis.call('HGET', key, 'doc')
  if doc then
    table.insert(docs, doc)
  else
    redis.call('ZREM', KEYS[1], key)
  end
end
return docs
";

/// Redis 文档存储
pub struct RedisStore {
    connection_manager: ConnectionManager,
    namespace: String,
    insert_script: Script,
    replace_script: Script,
    query_script: Script,
}

impl RedisStore {
    /// 连接 Redis
    pub async fn connect(url: &str, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Redis,
            "connect_to_redis",
            &format!("正在连接 Redis: namespace={namespace}")
        );

        let client = Client::open(url)
            .map_err(|e| CertDbError::config_with_source("创建 Redis 客户端失败", e))?;

        let connection_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CertDbError::backend_with_source("建立 Redis 连接失败", e))?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Redis,
            "redis_connected",
            "Redis 连接建立成功"
        );

        Ok(Self {
            connection_manager,
            namespace,
            insert_script: Script::new(INSERT_SCRIPT),
            replace_script: Script::new(REPLACE_SCRIPT),
            query_script: Script::new(QUERY_SCRIPT),
        })
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedDocument>> {
        let mut conn = self.connection_manager.clone();

        let (body, cas): (Option<String>, Option<u64>) = redis::cmd("HMGET")
            .arg(key)
            .arg("doc")
            .arg("cas")
            .query_async(&mut conn)
            .await
            .map_err(|e| CertDbError::backend_with_source(format!("读取文档失败: {key}"), e))?;

        match (body, cas) {
            (Some(body), Some(cas)) => Ok(Some(VersionedDocument {
                body,
                cas: Cas::from_raw(cas),
            })),
            (None, None) => Ok(None),
            _ => Err(CertDbError::corrupted(format!("文档缺少正文或版本号: {key}"))),
        }
    }

    async fn insert(&self, key: &str, doc: &StoredDocument) -> Result<InsertOutcome> {
        let mut conn = self.connection_manager.clone();
        let index = expiry_index_key(&self.namespace, doc.doc_type);

        let result: i64 = self
            .insert_script
            .key(key)
            .key(&index)
            .arg(&doc.body)
            .arg(doc.expiry_millis)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CertDbError::backend_with_source(format!("写入文档失败: {key}"), e))?;

        ldebug!(
            "system",
            LogStage::Mutation,
            LogComponent::Redis,
            "insert_document",
            &format!("插入文档: key={key}, result={result}")
        );

        match u64::try_from(result) {
            Ok(cas) => Ok(InsertOutcome::Inserted(Cas::from_raw(cas))),
            Err(_) => Ok(InsertOutcome::Exists),
        }
    }

    async fn replace(&self, key: &str, doc: &StoredDocument, cas: Cas) -> Result<ReplaceOutcome> {
        let mut conn = self.connection_manager.clone();
        let index = expiry_index_key(&self.namespace, doc.doc_type);

        let result: i64 = self
            .replace_script
            .key(key)
            .key(&index)
            .arg(&doc.body)
            .arg(doc.expiry_millis)
            .arg(cas.into_raw())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CertDbError::backend_with_source(format!("替换文档失败: {key}"), e))?;

        match u64::try_from(result) {
            Ok(next) => Ok(ReplaceOutcome::Replaced(Cas::from_raw(next))),
            Err(_) => Ok(ReplaceOutcome::Stale),
        }
    }

    async fn query_unexpired(
        &self,
        doc_type: RecordKind,
        min_expiry_millis: i64,
    ) -> Result<Vec<String>> {
        let mut conn = self.connection_manager.clone();
        let index = expiry_index_key(&self.namespace, doc_type);

        let docs: Vec<String> = self
            .query_script
            .key(&index)
            .arg(min_expiry_millis)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                CertDbError::backend_with_source(format!("查询过期索引失败: {index}"), e)
            })?;

        ldebug!(
            "system",
            LogStage::Query,
            LogComponent::Redis,
            "query_unexpired",
            &format!("索引查询完成: index={index}, count={}", docs.len())
        );
        Ok(docs)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();

        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CertDbError::backend_with_source("Redis ping 失败", e))?;

        if response == "PONG" {
            Ok(())
        } else {
            lerror!(
                "system",
                LogStage::Error,
                LogComponent::Redis,
                "ping_fail",
                &format!("Redis ping 响应异常: {response}")
            );
            Err(backend_error!("Redis ping 响应异常: {}", response))
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
