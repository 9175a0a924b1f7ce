//! # OCSP 响应记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ensure_record;
use crate::error::Result;

/// OCSP 响应记录，与证书共享复合主键，但独立存储
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcspRecord {
    pub serial: String,
    pub authority_key_identifier: String,
    pub body: String,
    pub expiry: DateTime<Utc>,
}

impl OcspRecord {
    pub fn new(
        serial: impl Into<String>,
        authority_key_identifier: impl Into<String>,
        body: impl Into<String>,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            serial: serial.into(),
            authority_key_identifier: authority_key_identifier.into(),
            body: body.into(),
            expiry,
        }
    }

    /// 刷新响应内容
    pub fn refresh(&mut self, body: impl Into<String>, expiry: DateTime<Utc>) {
        self.body = body.into();
        self.expiry = expiry;
    }

    #[must_use]
    pub fn is_unexpired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }

    #[must_use]
    pub fn matches(&self, serial: &str, aki: &str) -> bool {
        self.serial == serial && self.authority_key_identifier == aki
    }

    pub fn validate(&self) -> Result<()> {
        ensure_record!(!self.serial.is_empty(), "OCSP 序列号不能为空");
        ensure_record!(
            !self.authority_key_identifier.is_empty(),
            "OCSP AKI 不能为空: serial={}",
            self.serial
        );
        ensure_record!(!self.body.is_empty(), "OCSP 响应体不能为空: serial={}", self.serial);
        Ok(())
    }
}
