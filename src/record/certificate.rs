//! # 证书记录

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ensure_record;
use crate::error::{CertDbError, Result};

/// 证书状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    #[default]
    Good,
    Revoked,
}

impl CertificateStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateStatus {
    type Err = CertDbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "good" => Ok(Self::Good),
            "revoked" => Ok(Self::Revoked),
            other => Err(CertDbError::corrupted(format!("未知的证书状态: {other}"))),
        }
    }
}

/// RFC 5280 CRL 吊销原因码
///
/// 访问接口本身接收原始整数，这里只提供命名常量与校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrlReason {
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    RemoveFromCrl = 8,
    PrivilegeWithdrawn = 9,
    AaCompromise = 10,
}

impl CrlReason {
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for CrlReason {
    type Error = CertDbError;

    fn try_from(code: i32) -> Result<Self> {
        Ok(match code {
            0 => Self::Unspecified,
            1 => Self::KeyCompromise,
            2 => Self::CaCompromise,
            3 => Self::AffiliationChanged,
            4 => Self::Superseded,
            5 => Self::CessationOfOperation,
            6 => Self::CertificateHold,
            8 => Self::RemoveFromCrl,
            9 => Self::PrivilegeWithdrawn,
            10 => Self::AaCompromise,
            other => {
                return Err(CertDbError::invalid_record(format!(
                    "无效的 CRL 吊销原因码: {other}"
                )));
            }
        })
    }
}

impl FromStr for CrlReason {
    type Err = CertDbError;

    /// 接受数字或 RFC 5280 名称（不区分大小写）
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(code) = s.parse::<i32>() {
            return Self::try_from(code);
        }
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Ok(match normalized.as_str() {
            "unspecified" => Self::Unspecified,
            "keycompromise" => Self::KeyCompromise,
            "cacompromise" => Self::CaCompromise,
            "affiliationchanged" => Self::AffiliationChanged,
            "superseded" => Self::Superseded,
            "cessationofoperation" => Self::CessationOfOperation,
            "certificatehold" => Self::CertificateHold,
            "removefromcrl" => Self::RemoveFromCrl,
            "privilegewithdrawn" => Self::PrivilegeWithdrawn,
            "aacompromise" => Self::AaCompromise,
            _ => {
                return Err(CertDbError::invalid_record(format!(
                    "无效的 CRL 吊销原因: {s}"
                )));
            }
        })
    }
}

/// 证书记录
///
/// `(serial, authority_key_identifier)` 构成复合主键。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub serial: String,
    pub authority_key_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_label: Option<String>,
    #[serde(default)]
    pub status: CertificateStatus,
    #[serde(default)]
    pub reason: i32,
    pub expiry: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    pub pem: String,
}

impl CertificateRecord {
    /// 新签发的证书，状态为 good
    pub fn new(
        serial: impl Into<String>,
        authority_key_identifier: impl Into<String>,
        expiry: DateTime<Utc>,
        pem: impl Into<String>,
    ) -> Self {
        Self {
            serial: serial.into(),
            authority_key_identifier: authority_key_identifier.into(),
            ca_label: None,
            status: CertificateStatus::Good,
            reason: 0,
            expiry,
            revoked_at: None,
            pem: pem.into(),
        }
    }

    #[must_use]
    pub fn with_ca_label(mut self, ca_label: impl Into<String>) -> Self {
        self.ca_label = Some(ca_label.into());
        self
    }

    /// 标记为已吊销。重复吊销会覆盖原因码与时间。
    pub fn revoke(&mut self, reason: i32, at: DateTime<Utc>) {
        self.status = CertificateStatus::Revoked;
        self.reason = reason;
        self.revoked_at = Some(at);
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.status == CertificateStatus::Revoked
    }

    /// 严格晚于 `now` 才算未过期
    #[must_use]
    pub fn is_unexpired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }

    /// 是否匹配给定的复合主键
    #[must_use]
    pub fn matches(&self, serial: &str, aki: &str) -> bool {
        self.serial == serial && self.authority_key_identifier == aki
    }

    /// 校验必填字段与状态不变量
    pub fn validate(&self) -> Result<()> {
        ensure_record!(!self.serial.is_empty(), "证书序列号不能为空");
        ensure_record!(
            !self.authority_key_identifier.is_empty(),
            "证书 AKI 不能为空: serial={}",
            self.serial
        );
        ensure_record!(!self.pem.is_empty(), "证书 PEM 不能为空: serial={}", self.serial);
        ensure_record!(
            self.status == CertificateStatus::Revoked || self.revoked_at.is_none(),
            "状态为 good 的证书不能带有吊销时间: serial={}",
            self.serial
        );
        Ok(())
    }
}
