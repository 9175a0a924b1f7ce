//! # 数据库配置

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use super::FlatConfig;
use crate::error::{CertDbError, Result};
use crate::{config_error, linfo, logging::{LogComponent, LogStage}};

/// 支持的 SQL 驱动
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDriver {
    Sqlite,
    Postgres,
}

impl FromStr for SqlDriver {
    type Err = CertDbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pq" | "pgx" => Ok(Self::Postgres),
            other => Err(config_error!("不支持的数据库驱动: {}", other)),
        }
    }
}

impl fmt::Display for SqlDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        })
    }
}

/// 关系型数据库配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlConfig {
    /// 数据库驱动
    pub driver: SqlDriver,
    /// 数据源（URL、SQLite 文件路径或 `key=value` 形式的 PostgreSQL DSN）
    pub data_source: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 连接后是否自动执行迁移
    pub auto_migrate: bool,
}

impl SqlConfig {
    /// SQLite 文件数据库配置
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: SqlDriver::Sqlite,
            data_source: path.into(),
            max_connections: None,
            connect_timeout: None,
            auto_migrate: true,
        }
    }

    /// 从扁平配置构造并校验
    pub fn from_flat(config: &FlatConfig) -> Result<Self> {
        let driver: SqlDriver = config.require("driver")?.parse()?;
        let data_source = config.require("data_source")?.to_string();

        let sql = Self {
            driver,
            data_source,
            max_connections: config.parse_opt("max_connections")?,
            connect_timeout: config.parse_opt("connect_timeout")?,
            auto_migrate: config.parse_opt("auto_migrate")?.unwrap_or(true),
        };
        sql.connection_url()?;
        Ok(sql)
    }

    /// 检查是否为SQLite数据库
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.driver == SqlDriver::Sqlite
    }

    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.is_sqlite() && self.data_source.contains(":memory:")
    }

    /// 连接超时时间
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_secs)
    }

    /// 获取数据库连接 URL
    pub fn connection_url(&self) -> Result<String> {
        match self.driver {
            SqlDriver::Sqlite => Ok(self.sqlite_url()),
            SqlDriver::Postgres => self.postgres_url(),
        }
    }

    fn sqlite_url(&self) -> String {
        if self.is_memory_database() {
            "sqlite::memory:".to_string()
        } else if self.data_source.starts_with("sqlite:") {
            self.data_source.clone()
        } else {
            format!("sqlite://{}?mode=rwc", self.data_source)
        }
    }

    fn postgres_url(&self) -> Result<String> {
        let source = self.data_source.as_str();
        if source.starts_with("postgres://") || source.starts_with("postgresql://") {
            return Ok(source.to_string());
        }
        if !source.contains('=') {
            return Err(config_error!("无法识别的 PostgreSQL 数据源: {}", source));
        }

        // lib/pq 风格: host=localhost port=5432 user=certdb password=x dbname=certdb sslmode=disable
        let mut url = Url::parse("postgres://localhost")?;
        for pair in source.split_whitespace() {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| config_error!("PostgreSQL 数据源格式错误: {}", pair))?;
            let value = value.trim_matches('\'');
            match key {
                "host" => url.set_host(Some(value))?,
                "port" => {
                    let port = value
                        .parse::<u16>()
                        .map_err(|e| config_error!("PostgreSQL 端口无效 '{}': {}", value, e))?;
                    url.set_port(Some(port))
                        .map_err(|()| config_error!("无法设置 PostgreSQL 端口"))?;
                }
                "user" => url
                    .set_username(value)
                    .map_err(|()| config_error!("无法设置 PostgreSQL 用户名"))?,
                "password" => url
                    .set_password(Some(value))
                    .map_err(|()| config_error!("无法设置 PostgreSQL 密码"))?,
                "dbname" => url.set_path(value),
                _ => {
                    url.query_pairs_mut().append_pair(key, value);
                }
            }
        }
        Ok(url.to_string())
    }

    /// 确保数据库路径存在（仅对SQLite文件数据库）
    pub fn ensure_database_path(&self) -> Result<()> {
        if !self.is_sqlite() || self.is_memory_database() {
            return Ok(());
        }

        let path_str = self
            .data_source
            .strip_prefix("sqlite://")
            .or_else(|| self.data_source.strip_prefix("sqlite:"))
            .unwrap_or(&self.data_source);
        let path_str = path_str.split('?').next().unwrap_or(path_str);
        let db_path = Path::new(path_str);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CertDbError::config_with_source(
                        format!("无法创建数据库目录: {}", parent.display()),
                        e,
                    )
                })?;

                linfo!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Database,
                    "create_db_dir",
                    &format!("创建数据库目录: {}", parent.display())
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_aliases() {
        assert_eq!("sqlite3".parse::<SqlDriver>().unwrap(), SqlDriver::Sqlite);
        assert_eq!("PQ".parse::<SqlDriver>().unwrap(), SqlDriver::Postgres);
        assert!("mysql".parse::<SqlDriver>().is_err());
    }

    #[test]
    fn test_missing_keys() {
        let config = FlatConfig::from_pairs([("driver", "sqlite3")]);
        let err = SqlConfig::from_flat(&config).unwrap_err();
        assert!(err.to_string().contains("data_source"));

        let config = FlatConfig::from_pairs([("data_source", "certs.db")]);
        assert!(SqlConfig::from_flat(&config).is_err());
    }

    #[test]
    fn test_sqlite_urls() {
        assert_eq!(
            SqlConfig::sqlite("data/certs.db").connection_url().unwrap(),
            "sqlite://data/certs.db?mode=rwc"
        );
        assert_eq!(
            SqlConfig::sqlite(":memory:").connection_url().unwrap(),
            "sqlite::memory:"
        );
        assert_eq!(
            SqlConfig::sqlite("sqlite://x.db").connection_url().unwrap(),
            "sqlite://x.db"
        );
    }

    #[test]
    fn test_postgres_key_value_dsn() {
        let config = FlatConfig::from_pairs([
            ("driver", "postgres"),
            (
                "data_source",
                "host=db.internal port=5433 user=certdb password=pw dbname=certdb sslmode=disable",
            ),
        ]);
        let sql = SqlConfig::from_flat(&config).unwrap();
        assert_eq!(
            sql.connection_url().unwrap(),
            "postgres://certdb:pw@db.internal:5433/certdb?sslmode=disable"
        );
        assert!(sql.auto_migrate);
    }

    #[test]
    fn test_postgres_url_passthrough() {
        let mut sql = SqlConfig::sqlite("unused");
        sql.driver = SqlDriver::Postgres;
        sql.data_source = "postgres://u:p@localhost/certdb".to_string();
        assert_eq!(sql.connection_url().unwrap(), "postgres://u:p@localhost/certdb");

        sql.data_source = "certs.db".to_string();
        assert!(sql.connection_url().is_err());
    }

    #[test]
    fn test_ensure_database_path_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("certs.db");
        let sql = SqlConfig::sqlite(db_path.display().to_string());

        sql.ensure_database_path().unwrap();
        assert!(db_path.parent().unwrap().exists());
    }
}
