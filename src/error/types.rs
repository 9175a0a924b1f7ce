//! # 错误类型定义

use std::fmt;

use thiserror::Error;

use super::ErrorKind;

/// 记录类型，用于错误信息中标识资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// 证书记录
    Certificate,
    /// OCSP 响应记录
    Ocsp,
}

impl RecordKind {
    /// 文档类型标识（同时用作 KV 文档的类型判别字段）
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::Ocsp => "ocsp",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 证书存储主要错误类型
#[derive(Debug, Error)]
pub enum CertDbError {
    /// 记录不存在
    #[error("记录未找到: {kind} serial={serial} aki={aki}")]
    NotFound {
        kind: RecordKind,
        serial: String,
        aki: String,
    },

    /// 主键冲突
    #[error("记录已存在: {kind} serial={serial} aki={aki}")]
    DuplicateKey {
        kind: RecordKind,
        serial: String,
        aki: String,
    },

    /// 并发写入冲突（CAS 重试耗尽）
    #[error("并发写入冲突: key={key}, 已尝试 {attempts} 次")]
    Conflict { key: String, attempts: u32 },

    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 存储后端不可用（连接、传输、查询失败）
    #[error("存储后端不可用: {message}")]
    BackendUnavailable {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 存储数据损坏（无法解码）
    #[error("存储数据损坏: {message}")]
    Corrupted {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 记录字段不合法
    #[error("记录无效: {message}")]
    InvalidRecord { message: String },

    /// 附加上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CertDbError>,
    },
}

impl CertDbError {
    /// 错误分类，调用方据此决定重试或上报
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Config { .. } => ErrorKind::Configuration,
            Self::BackendUnavailable { .. } | Self::Corrupted { .. } => {
                ErrorKind::BackendUnavailable
            }
            Self::InvalidRecord { .. } => ErrorKind::InvalidRecord,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// 仅并发冲突可以安全重试
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// 创建记录未找到错误
    pub fn not_found(kind: RecordKind, serial: impl Into<String>, aki: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            serial: serial.into(),
            aki: aki.into(),
        }
    }

    /// 创建主键冲突错误
    pub fn duplicate_key(
        kind: RecordKind,
        serial: impl Into<String>,
        aki: impl Into<String>,
    ) -> Self {
        Self::DuplicateKey {
            kind,
            serial: serial.into(),
            aki: aki.into(),
        }
    }

    /// 创建并发冲突错误
    pub fn conflict(key: impl Into<String>, attempts: u32) -> Self {
        Self::Conflict {
            key: key.into(),
            attempts,
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建后端不可用错误
    pub fn backend<T: Into<String>>(message: T) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的后端不可用错误
    pub fn backend_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据损坏错误
    pub fn corrupted<T: Into<String>>(message: T) -> Self {
        Self::Corrupted {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据损坏错误
    pub fn corrupted_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Corrupted {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建记录无效错误
    pub fn invalid_record<T: Into<String>>(message: T) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for CertDbError {
    fn from(err: std::io::Error) -> Self {
        Self::config_with_source("文件操作失败", err)
    }
}

impl From<serde_json::Error> for CertDbError {
    fn from(err: serde_json::Error) -> Self {
        Self::corrupted_with_source("JSON处理失败", err)
    }
}

impl From<sea_orm::error::DbErr> for CertDbError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::backend_with_source("数据库操作失败", err)
    }
}

// Redis错误转换
impl From<redis::RedisError> for CertDbError {
    fn from(err: redis::RedisError) -> Self {
        Self::backend_with_source("Redis操作失败", err)
    }
}

impl From<url::ParseError> for CertDbError {
    fn from(err: url::ParseError) -> Self {
        Self::config_with_source("URI解析失败", err)
    }
}
