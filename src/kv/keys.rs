//! # 文档键命名规范
//!
//! - 证书文档: `{namespace}:certificate:{serial}:{aki}`
//! - OCSP 文档: `{namespace}:ocsp:{serial}:{aki}`
//! - 过期索引: `{namespace}:expiry:{type}`
//!
//! 旧版键方案只使用序列号（`{namespace}:certificate:{serial}`），此时读出的文档
//! 必须再校验 AKI。

use std::fmt;
use std::str::FromStr;

use crate::config_error;
use crate::error::{CertDbError, RecordKind};

/// 键生成方案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyScheme {
    /// 序列号 + AKI
    #[default]
    Composite,
    /// 仅序列号（兼容旧数据）
    SerialOnly,
}

impl FromStr for KeyScheme {
    type Err = CertDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "composite" => Ok(Self::Composite),
            "serial" | "serial_only" | "legacy" => Ok(Self::SerialOnly),
            other => Err(config_error!("未知的键方案: {}", other)),
        }
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Composite => "composite",
            Self::SerialOnly => "serial",
        })
    }
}

/// 文档键构建器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    namespace: String,
    scheme: KeyScheme,
}

impl KeyBuilder {
    pub fn new(namespace: impl Into<String>, scheme: KeyScheme) -> Self {
        Self {
            namespace: namespace.into(),
            scheme,
        }
    }

    /// 记录文档键
    #[must_use]
    pub fn document(&self, kind: RecordKind, serial: &str, aki: &str) -> String {
        match self.scheme {
            KeyScheme::Composite => format!(
                "{}:{}:{}:{}",
                self.namespace,
                kind.as_str(),
                escape_component(serial),
                escape_component(aki)
            ),
            KeyScheme::SerialOnly => format!(
                "{}:{}:{}",
                self.namespace,
                kind.as_str(),
                escape_component(serial)
            ),
        }
    }

    /// 过期时间索引键
    #[must_use]
    pub fn expiry_index(&self, kind: RecordKind) -> String {
        expiry_index_key(&self.namespace, kind)
    }
}

/// 过期时间索引键
#[must_use]
pub fn expiry_index_key(namespace: &str, kind: RecordKind) -> String {
    format!("{namespace}:expiry:{}", kind.as_str())
}

/// 转义键分隔符，避免序列号或 AKI 中的 ':' 造成键冲突
fn escape_component(component: &str) -> String {
    component.replace('%', "%25").replace(':', "%3A")
}
