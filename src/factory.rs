//! # 访问器工厂
//!
//! 根据配置构造唯一的 `Arc<dyn Accessor>`，调用方在进程生命周期内持有并共享它。

use std::path::Path;
use std::sync::Arc;

use crate::accessor::Accessor;
use crate::config::{AccessorConfig, KvConfig, KvEndpoint};
use crate::error::{Context, Result};
use crate::kv::{KvAccessor, MemoryStore, RedisStore};
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::sql::SqlAccessor;

/// 根据已校验的配置构造访问器
pub async fn new_accessor(config: &AccessorConfig) -> Result<Arc<dyn Accessor>> {
    let accessor: Arc<dyn Accessor> = match config {
        AccessorConfig::Kv(kv) => new_kv_accessor(kv).await?,
        AccessorConfig::Sql(sql) => Arc::new(
            SqlAccessor::connect(sql)
                .await
                .context("初始化 SQL 访问器失败")?,
        ),
    };

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Factory,
        "accessor_ready",
        &format!("访问器已就绪: backend={}", accessor.backend())
    );
    Ok(accessor)
}

async fn new_kv_accessor(config: &KvConfig) -> Result<Arc<dyn Accessor>> {
    match config.endpoint()? {
        KvEndpoint::Memory => Ok(Arc::new(KvAccessor::from_config(MemoryStore::new(), config))),
        KvEndpoint::Redis => {
            let store = RedisStore::connect(&config.redis_url()?, &config.namespace)
                .await
                .context("初始化 Redis 存储失败")?;
            Ok(Arc::new(KvAccessor::from_config(store, config)))
        }
    }
}

/// 读取 JSON 配置文件并构造访问器
pub async fn accessor_from_file(path: impl AsRef<Path>) -> Result<Arc<dyn Accessor>> {
    let config = AccessorConfig::from_file(path)?;
    new_accessor(&config).await
}
