//! # 扁平配置文档
//!
//! 配置文件是一个扁平的 JSON 对象：`{"engine": "kv", "uri": "...", ...}`。
//! 标量值（字符串、数字、布尔）统一转为字符串保存，嵌套值视为配置错误。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;

use crate::error::{CertDbError, Result};
use crate::{config_error, ldebug, logging::{LogComponent, LogStage}};

/// 已解析的扁平键值配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatConfig {
    values: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl FlatConfig {
    /// 从键值对构造，主要用于测试与程序内组装
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source: None,
        }
    }

    /// 解析 JSON 文本
    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)
            .map_err(|e| CertDbError::config_with_source("配置文件不是合法的 JSON", e))?;

        let Value::Object(map) = document else {
            return Err(config_error!("配置文件顶层必须是 JSON 对象"));
        };

        let mut values = BTreeMap::new();
        for (key, value) in map {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(config_error!("配置项 '{}' 必须是标量值", key));
                }
            };
            values.insert(key, text);
        }

        Ok(Self {
            values,
            source: None,
        })
    }

    /// 读取并解析配置文件
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ldebug!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "load_config_file",
            &format!("加载存储配置文件: {}", path.display())
        );

        let content = std::fs::read_to_string(path).map_err(|e| {
            CertDbError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        let mut config = Self::from_json_str(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// 配置来源文件（如果有）
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 获取非空配置值
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 获取必填配置值，缺失时报错
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| match &self.source {
            Some(path) => config_error!(
                "缺少必填配置项 '{}' ({})",
                key,
                path.display()
            ),
            None => config_error!("缺少必填配置项 '{}'", key),
        })
    }

    /// 解析可选配置值
    pub fn parse_opt<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| config_error!("配置项 '{}' 的值无效 '{}': {}", key, raw, e))
            })
            .transpose()
    }
}
