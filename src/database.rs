//! # 数据库模块
//!
//! 数据库连接和迁移管理

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::SqlConfig;
use crate::error::{CertDbError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{lerror, linfo, lwarn};

/// 默认连接池大小
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// 默认连接超时（秒）
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// 初始化数据库连接
pub async fn init_database(config: &SqlConfig) -> Result<DatabaseConnection> {
    let url = config.connection_url()?;
    linfo!(
        "system",
        LogStage::Db,
        LogComponent::Database,
        "connect_db",
        &format!("正在连接数据库: driver={}", config.driver)
    );

    config.ensure_database_path()?;

    let mut options = ConnectOptions::new(url);
    // 每个 SQLite 内存连接都是一个独立的库，只能用单连接
    let max_connections = if config.is_memory_database() {
        1
    } else {
        config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    };
    options
        .max_connections(max_connections)
        .connect_timeout(
            config
                .connect_timeout()
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
        )
        .sqlx_logging(false);
    if config.is_memory_database() {
        options.min_connections(1);
    }

    let db = Database::connect(options)
        .await
        .map_err(|e| CertDbError::backend_with_source("数据库连接失败", e))?;

    linfo!(
        "system",
        LogStage::Db,
        LogComponent::Database,
        "db_connected",
        "数据库连接成功",
        max_connections = max_connections
    );
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    linfo!(
        "system",
        LogStage::Db,
        LogComponent::Database,
        "migrate",
        "开始运行数据库迁移..."
    );

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            linfo!(
                "system",
                LogStage::Db,
                LogComponent::Database,
                "migrate_done",
                "数据库迁移完成"
            );
            Ok(())
        }
        Err(e) => {
            lerror!(
                "system",
                LogStage::Error,
                LogComponent::Database,
                "migrate_fail",
                &format!("数据库迁移失败: {e}")
            );
            Err(CertDbError::backend_with_source("数据库迁移失败", e))
        }
    }
}

/// 检查数据库状态，返回待应用的迁移数量
pub async fn check_database_status(db: &DatabaseConnection) -> Result<usize> {
    let pending = ::migration::Migrator::get_pending_migrations(db).await?;

    if pending.is_empty() {
        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Database,
            "migration_status",
            "所有迁移都已应用"
        );
    } else {
        lwarn!(
            "system",
            LogStage::Db,
            LogComponent::Database,
            "migration_status",
            &format!("有 {} 个待应用的迁移", pending.len())
        );
    }

    Ok(pending.len())
}
