//! # 证书实体定义
//!
//! 已签发证书及其吊销状态，复合主键 `(serial_number, authority_key_identifier)`

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 证书实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub serial_number: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub authority_key_identifier: String,
    pub ca_label: Option<String>,
    /// `good` 或 `revoked`
    pub status: String,
    /// CRL 吊销原因码
    pub reason: i32,
    pub expiry: DateTimeUtc,
    pub revoked_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Text")]
    pub pem: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
