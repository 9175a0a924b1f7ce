//! # 配置管理模块
//!
//! 存储后端配置的加载与校验。配置在构造访问器时读取一次，之后不可变。

mod database;
mod flat;
mod kv;

pub use database::{SqlConfig, SqlDriver};
pub use flat::FlatConfig;
pub use kv::{DEFAULT_MAX_CAS_RETRIES, KvConfig, KvEndpoint};

use std::env;
use std::path::{Path, PathBuf};

use crate::accessor::BackendKind;
use crate::error::Result;
use crate::{config_error, linfo, logging::{LogComponent, LogStage}};

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV_VAR: &str = "CERTDB_CONFIG";

/// 已校验的访问器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorConfig {
    /// `engine = "kv"`
    Kv(KvConfig),
    /// `engine = "sql"`
    Sql(SqlConfig),
}

impl AccessorConfig {
    /// 从扁平配置构造
    pub fn from_flat(config: &FlatConfig) -> Result<Self> {
        let engine = config.require("engine")?;
        let parsed = match engine.to_ascii_lowercase().as_str() {
            "kv" => Self::Kv(KvConfig::from_flat(config)?),
            "sql" => Self::Sql(SqlConfig::from_flat(config)?),
            other => return Err(config_error!("未知的存储引擎: {}", other)),
        };

        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "config_loaded",
            &format!("存储配置加载完成: engine={}", parsed.backend())
        );
        Ok(parsed)
    }

    /// 从 JSON 文本构造
    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_flat(&FlatConfig::from_json_str(content)?)
    }

    /// 从配置文件构造
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_flat(&FlatConfig::from_file(path)?)
    }

    /// 对应的后端类型
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        match self {
            Self::Kv(_) => BackendKind::Kv,
            Self::Sql(_) => BackendKind::Sql,
        }
    }
}

/// 从 `CERTDB_CONFIG` 环境变量读取配置文件路径
#[must_use]
pub fn config_path_from_env() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
