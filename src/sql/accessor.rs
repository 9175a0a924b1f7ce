//! # 关系型数据库访问器

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity::{Certificates, OcspResponses, certificates, ocsp_responses};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

use super::models::{
    certificate_active_model, certificate_from_model, ocsp_active_model, ocsp_from_model,
};
use crate::accessor::{Accessor, BackendKind};
use crate::config::SqlConfig;
use crate::database::{init_database, run_migrations};
use crate::error::{CertDbError, RecordKind, Result};
use crate::logging::{LogComponent, LogStage};
use crate::record::{CertificateRecord, CertificateStatus, OcspRecord};
use crate::{ldebug, linfo};

/// 基于 Sea-ORM 的访问器
pub struct SqlAccessor {
    db: Arc<DatabaseConnection>,
}

impl SqlAccessor {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 建立连接，按配置执行迁移
    pub async fn connect(config: &SqlConfig) -> Result<Self> {
        let db = init_database(config).await?;
        if config.auto_migrate {
            run_migrations(&db).await?;
        }
        Ok(Self::new(Arc::new(db)))
    }
}

/// 唯一约束冲突转为 `DuplicateKey`，其他错误视为后端故障
fn map_insert_error(err: DbErr, kind: RecordKind, serial: &str, aki: &str) -> CertDbError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        CertDbError::duplicate_key(kind, serial, aki)
    } else {
        CertDbError::backend_with_source(format!("写入 {kind} 失败: serial={serial}"), err)
    }
}

#[async_trait]
impl Accessor for SqlAccessor {
    async fn insert_certificate(&self, record: &CertificateRecord) -> Result<()> {
        record.validate()?;

        Certificates::insert(certificate_active_model(record))
            .exec_without_returning(&*self.db)
            .await
            .map_err(|e| {
                map_insert_error(
                    e,
                    RecordKind::Certificate,
                    &record.serial,
                    &record.authority_key_identifier,
                )
            })?;

        ldebug!(
            "system",
            LogStage::Mutation,
            LogComponent::Database,
            "insert_certificate",
            &format!("写入证书: serial={}", record.serial)
        );
        Ok(())
    }

    async fn get_certificate(&self, serial: &str, aki: &str) -> Result<Vec<CertificateRecord>> {
        Certificates::find_by_id((serial.to_string(), aki.to_string()))
            .one(&*self.db)
            .await?
            .map(certificate_from_model)
            .into_iter()
            .collect()
    }

    async fn get_unexpired_certificates(&self) -> Result<Vec<CertificateRecord>> {
        let now = Utc::now();
        let models = Certificates::find()
            .filter(certificates::Column::Expiry.gt(now))
            .all(&*self.db)
            .await?;

        models.into_iter().map(certificate_from_model).collect()
    }

    async fn revoke_certificate(&self, serial: &str, aki: &str, reason_code: i32) -> Result<()> {
        let update_model = certificates::ActiveModel {
            status: Set(CertificateStatus::Revoked.as_str().to_string()),
            reason: Set(reason_code),
            revoked_at: Set(Some(Utc::now())),
            ..Default::default()
        };

        let txn = self.db.begin().await?;
        let update_result = Certificates::update_many()
            .filter(certificates::Column::SerialNumber.eq(serial))
            .filter(certificates::Column::AuthorityKeyIdentifier.eq(aki))
            .set(update_model)
            .exec(&txn)
            .await?;

        if update_result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(CertDbError::not_found(RecordKind::Certificate, serial, aki));
        }
        txn.commit().await?;

        linfo!(
            "system",
            LogStage::Mutation,
            LogComponent::Database,
            "revoke_certificate",
            &format!("证书已吊销: serial={serial}, reason={reason_code}")
        );
        Ok(())
    }

    async fn insert_ocsp(&self, record: &OcspRecord) -> Result<()> {
        record.validate()?;

        OcspResponses::insert(ocsp_active_model(record))
            .exec_without_returning(&*self.db)
            .await
            .map_err(|e| {
                map_insert_error(
                    e,
                    RecordKind::Ocsp,
                    &record.serial,
                    &record.authority_key_identifier,
                )
            })?;
        Ok(())
    }

    async fn get_ocsp(&self, serial: &str, aki: &str) -> Result<Vec<OcspRecord>> {
        Ok(OcspResponses::find_by_id((serial.to_string(), aki.to_string()))
            .one(&*self.db)
            .await?
            .map(ocsp_from_model)
            .into_iter()
            .collect())
    }

    async fn get_unexpired_ocsps(&self) -> Result<Vec<OcspRecord>> {
        let models = OcspResponses::find()
            .filter(ocsp_responses::Column::Expiry.gt(Utc::now()))
            .all(&*self.db)
            .await?;

        Ok(models.into_iter().map(ocsp_from_model).collect())
    }

    async fn update_ocsp(
        &self,
        serial: &str,
        aki: &str,
        body: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        let record = OcspRecord::new(serial, aki, body, expiry);
        record.validate()?;

        let update_model = ocsp_responses::ActiveModel {
            body: Set(record.body),
            expiry: Set(record.expiry),
            ..Default::default()
        };

        let update_result = OcspResponses::update_many()
            .filter(ocsp_responses::Column::SerialNumber.eq(serial))
            .filter(ocsp_responses::Column::AuthorityKeyIdentifier.eq(aki))
            .set(update_model)
            .exec(&*self.db)
            .await?;

        if update_result.rows_affected == 0 {
            return Err(CertDbError::not_found(RecordKind::Ocsp, serial, aki));
        }
        Ok(())
    }

    async fn upsert_ocsp(
        &self,
        serial: &str,
        aki: &str,
        body: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        let record = OcspRecord::new(serial, aki, body, expiry);
        record.validate()?;

        OcspResponses::insert(ocsp_active_model(&record))
            .on_conflict(
                OnConflict::columns([
                    ocsp_responses::Column::SerialNumber,
                    ocsp_responses::Column::AuthorityKeyIdentifier,
                ])
                .update_columns([ocsp_responses::Column::Body, ocsp_responses::Column::Expiry])
                .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| CertDbError::backend_with_source("数据库 ping 失败", e))
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Sql
    }
}
