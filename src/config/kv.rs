//! # 键值存储配置

use url::Url;

use super::FlatConfig;
use crate::error::Result;
use crate::kv::KeyScheme;
use crate::{config_error, ensure_config};

/// CAS 读-改-写的默认最大尝试次数
pub const DEFAULT_MAX_CAS_RETRIES: u32 = 5;

/// 键值存储的连接端点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvEndpoint {
    /// 进程内存储（`memory://`）
    Memory,
    /// Redis（`redis://`、`rediss://`、`redis+unix://`）
    Redis,
}

/// 键值存储配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvConfig {
    /// 连接地址
    pub uri: String,
    /// 键命名空间（来自 `prefix` 或 `bucket`）
    pub namespace: String,
    /// 连接密码（可选，URI 中未携带时注入）
    pub password: Option<String>,
    /// 键生成方案
    pub key_scheme: KeyScheme,
    /// CAS 冲突时的最大尝试次数
    pub max_cas_retries: u32,
}

impl KvConfig {
    /// 内存存储配置，用于开发与测试
    pub fn memory(namespace: impl Into<String>) -> Self {
        Self {
            uri: "memory://".to_string(),
            namespace: namespace.into(),
            password: None,
            key_scheme: KeyScheme::default(),
            max_cas_retries: DEFAULT_MAX_CAS_RETRIES,
        }
    }

    /// 从扁平配置构造并校验
    pub fn from_flat(config: &FlatConfig) -> Result<Self> {
        let uri = config.require("uri")?.to_string();

        let namespace = config
            .get("prefix")
            .or_else(|| config.get("bucket"))
            .ok_or_else(|| config_error!("键值存储需要配置 'prefix' 或 'bucket'"))?
            .to_string();

        let key_scheme = config.parse_opt::<KeyScheme>("key_scheme")?.unwrap_or_default();
        let max_cas_retries = config
            .parse_opt::<u32>("max_cas_retries")?
            .unwrap_or(DEFAULT_MAX_CAS_RETRIES);
        ensure_config!(max_cas_retries > 0, "max_cas_retries 必须大于 0");

        let kv = Self {
            uri,
            namespace,
            password: config.get("password").map(str::to_string),
            key_scheme,
            max_cas_retries,
        };
        // 提前校验 URI，避免到连接阶段才失败
        kv.endpoint()?;
        Ok(kv)
    }

    /// 根据 URI scheme 判断端点类型
    pub fn endpoint(&self) -> Result<KvEndpoint> {
        let url = Url::parse(&self.uri)?;
        match url.scheme() {
            "memory" | "mem" => Ok(KvEndpoint::Memory),
            "redis" | "rediss" | "redis+unix" | "unix" => Ok(KvEndpoint::Redis),
            other => Err(config_error!("不支持的键值存储 URI scheme: {}", other)),
        }
    }

    /// 构建 Redis 连接 URL，必要时注入密码
    ///
    /// TCP 地址写入 userinfo，unix 套接字地址没有主机部分，改用 `pass` 查询参数。
    /// URI 中已带密码时以 URI 为准。
    pub fn redis_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.uri)?;
        let Some(password) = &self.password else {
            return Ok(url.to_string());
        };

        if matches!(url.scheme(), "redis+unix" | "unix") {
            if !url.query_pairs().any(|(name, _)| name == "pass") {
                url.query_pairs_mut().append_pair("pass", password);
            }
        } else if url.password().is_none() {
            url.set_password(Some(password))
                .map_err(|()| config_error!("无法向 URI 注入密码: {}", self.uri))?;
        }
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_or_bucket_required() {
        let config = FlatConfig::from_pairs([("uri", "redis://127.0.0.1:6379")]);
        assert!(KvConfig::from_flat(&config).is_err());

        let config = FlatConfig::from_pairs([("uri", "redis://127.0.0.1:6379"), ("bucket", "certs")]);
        let kv = KvConfig::from_flat(&config).unwrap();
        assert_eq!(kv.namespace, "certs");
        assert_eq!(kv.max_cas_retries, DEFAULT_MAX_CAS_RETRIES);
        assert_eq!(kv.key_scheme, KeyScheme::Composite);
    }

    #[test]
    fn test_prefix_wins_over_bucket() {
        let config = FlatConfig::from_pairs([
            ("uri", "memory://"),
            ("prefix", "pki"),
            ("bucket", "certs"),
        ]);
        let kv = KvConfig::from_flat(&config).unwrap();
        assert_eq!(kv.namespace, "pki");
        assert_eq!(kv.endpoint().unwrap(), KvEndpoint::Memory);
    }

    #[test]
    fn test_unsupported_scheme() {
        let config = FlatConfig::from_pairs([("uri", "couchbase://localhost"), ("prefix", "pki")]);
        assert!(KvConfig::from_flat(&config).is_err());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let config = FlatConfig::from_pairs([
            ("uri", "memory://"),
            ("prefix", "pki"),
            ("max_cas_retries", "0"),
        ]);
        assert!(KvConfig::from_flat(&config).is_err());
    }

    #[test]
    fn test_password_injection() {
        let mut kv = KvConfig::memory("pki");
        kv.uri = "redis://127.0.0.1:6379/2".to_string();
        kv.password = Some("s3cret".to_string());
        assert_eq!(kv.redis_url().unwrap(), "redis://:s3cret@127.0.0.1:6379/2");

        kv.uri = "redis://:inline@127.0.0.1:6379/2".to_string();
        assert_eq!(kv.redis_url().unwrap(), "redis://:inline@127.0.0.1:6379/2");
    }

    #[test]
    fn test_password_for_unix_socket() {
        let mut kv = KvConfig::memory("pki");
        kv.uri = "redis+unix:///run/redis.sock?db=2".to_string();
        kv.password = Some("s3cret".to_string());
        assert_eq!(
            kv.redis_url().unwrap(),
            "redis+unix:///run/redis.sock?db=2&pass=s3cret"
        );

        kv.uri = "unix:///run/redis.sock?pass=inline".to_string();
        assert_eq!(kv.redis_url().unwrap(), "unix:///run/redis.sock?pass=inline");
    }

    #[test]
    fn test_password_without_destination_rejected() {
        let mut kv = KvConfig::memory("pki");
        kv.password = Some("s3cret".to_string());
        let err = kv.redis_url().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
