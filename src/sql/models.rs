//! 记录与实体模型之间的转换

use std::str::FromStr;

use entity::{certificates, ocsp_responses};
use sea_orm::Set;

use crate::error::Result;
use crate::record::{CertificateRecord, CertificateStatus, OcspRecord};

pub(super) fn certificate_active_model(record: &CertificateRecord) -> certificates::ActiveModel {
    certificates::ActiveModel {
        serial_number: Set(record.serial.clone()),
        authority_key_identifier: Set(record.authority_key_identifier.clone()),
        ca_label: Set(record.ca_label.clone()),
        status: Set(record.status.as_str().to_string()),
        reason: Set(record.reason),
        expiry: Set(record.expiry),
        revoked_at: Set(record.revoked_at),
        pem: Set(record.pem.clone()),
    }
}

/// 状态列无法识别时返回 `Corrupted`
pub(super) fn certificate_from_model(model: certificates::Model) -> Result<CertificateRecord> {
    Ok(CertificateRecord {
        status: CertificateStatus::from_str(&model.status)?,
        serial: model.serial_number,
        authority_key_identifier: model.authority_key_identifier,
        ca_label: model.ca_label,
        reason: model.reason,
        expiry: model.expiry,
        revoked_at: model.revoked_at,
        pem: model.pem,
    })
}

pub(super) fn ocsp_active_model(record: &OcspRecord) -> ocsp_responses::ActiveModel {
    ocsp_responses::ActiveModel {
        serial_number: Set(record.serial.clone()),
        authority_key_identifier: Set(record.authority_key_identifier.clone()),
        body: Set(record.body.clone()),
        expiry: Set(record.expiry),
    }
}

pub(super) fn ocsp_from_model(model: ocsp_responses::Model) -> OcspRecord {
    OcspRecord {
        serial: model.serial_number,
        authority_key_identifier: model.authority_key_identifier,
        body: model.body,
        expiry: model.expiry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CertDbError;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn model(status: &str) -> certificates::Model {
        certificates::Model {
            serial_number: "01".into(),
            authority_key_identifier: "AKI".into(),
            ca_label: Some("root".into()),
            status: status.into(),
            reason: 1,
            expiry: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            revoked_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            pem: "PEM".into(),
        }
    }

    #[test]
    fn test_certificate_from_model() {
        let record = certificate_from_model(model("revoked")).unwrap();
        assert!(record.is_revoked());
        assert_eq!(record.ca_label.as_deref(), Some("root"));
        assert_eq!(record.reason, 1);
    }

    #[test]
    fn test_unknown_status_is_corrupted() {
        let err = certificate_from_model(model("suspended")).unwrap_err();
        assert!(matches!(err, CertDbError::Corrupted { .. }));
    }
}
