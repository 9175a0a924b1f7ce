//! # 日志配置模块
//!
//! 结构化日志宏与 tracing-subscriber 初始化。
//!
//! 所有日志宏的参数顺序一致：
//! `(request_id, LogStage, LogComponent, operation, message, key = value, ...)`

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Configuration,
    Db,
    Mutation,
    Query,
    Retry,
    Error,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Configuration => "configuration",
            Self::Db => "db",
            Self::Mutation => "mutation",
            Self::Query => "query",
            Self::Retry => "retry",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    Config,
    Factory,
    Redis,
    Database,
    Accessor,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::Factory => "factory",
            Self::Redis => "redis",
            Self::Database => "database",
            Self::Accessor => "accessor",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_event {
    ($level:expr, $request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::event!(
            $level,
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = ?$value,)*
            "{}",
            $message
        )
    };
}

/// info 级别结构化日志
#[macro_export]
macro_rules! linfo {
    ($($arg:tt)+) => {
        $crate::__log_event!(::tracing::Level::INFO, $($arg)+)
    };
}

/// debug 级别结构化日志
#[macro_export]
macro_rules! ldebug {
    ($($arg:tt)+) => {
        $crate::__log_event!(::tracing::Level::DEBUG, $($arg)+)
    };
}

/// warn 级别结构化日志
#[macro_export]
macro_rules! lwarn {
    ($($arg:tt)+) => {
        $crate::__log_event!(::tracing::Level::WARN, $($arg)+)
    };
}

/// error 级别结构化日志
#[macro_export]
macro_rules! lerror {
    ($($arg:tt)+) => {
        $crate::__log_event!(::tracing::Level::ERROR, $($arg)+)
    };
}

/// 未设置 `RUST_LOG` 时的过滤规则，本 crate 跟随 `level`，数据库查询日志保持静默
fn default_filter(level: &str) -> String {
    format!("{level},certdb={level},sqlx::query=off,sea_orm::query=warn,sqlx=warn")
}

/// 初始化优化的日志系统
///
/// 日志写入 stderr，stdout 留给命令输出。
pub fn init_optimized_logging(log_level: Option<&String>) {
    let level = log_level.map_or("info", std::string::String::as_str);
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    // 重复初始化（例如测试中）直接忽略
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            fmt_layer::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
