//! # OCSP 响应实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// OCSP 响应缓存实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ocsp_responses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub serial_number: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub authority_key_identifier: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub expiry: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
