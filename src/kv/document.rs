//! # 文档编解码
//!
//! KV 文档统一包装为 `{"type": "<certificate|ocsp>", "record": {...}}`，
//! 类型判别字段不匹配视为数据损坏。

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::store::StoredDocument;
use crate::error::{CertDbError, RecordKind, Result};
use crate::record::{CertificateRecord, OcspRecord};

/// 可作为 KV 文档存储的记录
pub trait KvRecord: Serialize + DeserializeOwned + Send + Sync {
    const KIND: RecordKind;

    fn serial(&self) -> &str;
    fn authority_key_identifier(&self) -> &str;
    fn expiry(&self) -> DateTime<Utc>;
    fn matches_key(&self, serial: &str, aki: &str) -> bool;
    fn is_unexpired_at(&self, now: DateTime<Utc>) -> bool;
}

impl KvRecord for CertificateRecord {
    const KIND: RecordKind = RecordKind::Certificate;

    fn serial(&self) -> &str {
        &self.serial
    }

    fn authority_key_identifier(&self) -> &str {
        &self.authority_key_identifier
    }

    fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    fn matches_key(&self, serial: &str, aki: &str) -> bool {
        self.matches(serial, aki)
    }

    fn is_unexpired_at(&self, now: DateTime<Utc>) -> bool {
        Self::is_unexpired_at(self, now)
    }
}

impl KvRecord for OcspRecord {
    const KIND: RecordKind = RecordKind::Ocsp;

    fn serial(&self) -> &str {
        &self.serial
    }

    fn authority_key_identifier(&self) -> &str {
        &self.authority_key_identifier
    }

    fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    fn matches_key(&self, serial: &str, aki: &str) -> bool {
        self.matches(serial, aki)
    }

    fn is_unexpired_at(&self, now: DateTime<Utc>) -> bool {
        Self::is_unexpired_at(self, now)
    }
}

#[derive(Serialize)]
struct WrapperRef<'a, T> {
    #[serde(rename = "type")]
    doc_type: &'static str,
    record: &'a T,
}

#[derive(Deserialize)]
struct Wrapper<T> {
    #[serde(rename = "type")]
    doc_type: String,
    record: T,
}

#[derive(Deserialize)]
struct TypeOnly {
    #[serde(rename = "type")]
    doc_type: String,
}

/// 序列化为存储文档
pub fn encode<T: KvRecord>(record: &T) -> Result<StoredDocument> {
    let body = serde_json::to_string(&WrapperRef {
        doc_type: T::KIND.as_str(),
        record,
    })?;

    Ok(StoredDocument {
        doc_type: T::KIND,
        expiry_millis: record.expiry().timestamp_millis(),
        body,
    })
}

/// 反序列化存储文档，类型不符或格式错误返回 `Corrupted`
pub fn decode<T: KvRecord>(key: &str, body: &str) -> Result<T> {
    // 先只读判别字段，避免把类型错误报告成字段缺失
    let header: TypeOnly = serde_json::from_str(body).map_err(|e| {
        CertDbError::corrupted_with_source(format!("文档格式错误: key={key}"), e)
    })?;
    if header.doc_type != T::KIND.as_str() {
        return Err(CertDbError::corrupted(format!(
            "文档类型不匹配: key={key}, 期望 {}, 实际 {}",
            T::KIND,
            header.doc_type
        )));
    }

    let wrapper: Wrapper<T> = serde_json::from_str(body).map_err(|e| {
        CertDbError::corrupted_with_source(format!("文档解码失败: key={key}"), e)
    })?;
    debug_assert_eq!(wrapper.doc_type, T::KIND.as_str());
    Ok(wrapper.record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_cert() -> CertificateRecord {
        CertificateRecord::new(
            "01",
            "AKI",
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            "-----BEGIN CERTIFICATE-----",
        )
    }

    #[test]
    fn test_key_match_and_expiry_follow_record() {
        let cert = sample_cert();
        assert!(cert.matches_key("01", "AKI"));
        assert!(!cert.matches_key("01", "OTHER"));
        assert!(KvRecord::is_unexpired_at(&cert, cert.expiry - chrono::Duration::milliseconds(1)));
        assert!(!KvRecord::is_unexpired_at(&cert, cert.expiry));

        let ocsp = OcspRecord::new("01", "AKI", "body", cert.expiry);
        assert!(!ocsp.matches_key("02", "AKI"));
        assert!(!KvRecord::is_unexpired_at(&ocsp, cert.expiry));
    }

    #[test]
    fn test_wrapper_layout() {
        let doc = encode(&sample_cert()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc.body).unwrap();

        assert_eq!(value["type"], "certificate");
        assert_eq!(value["record"]["serial"], "01");
        assert_eq!(doc.doc_type, RecordKind::Certificate);
        assert_eq!(doc.expiry_millis, sample_cert().expiry.timestamp_millis());
    }

    #[test]
    fn test_decode_returns_record() {
        let doc = encode(&sample_cert()).unwrap();
        let decoded: CertificateRecord = decode("k", &doc.body).unwrap();
        assert_eq!(decoded, sample_cert());
    }

    #[test]
    fn test_type_mismatch_is_corrupted() {
        let doc = encode(&sample_cert()).unwrap();
        let err = decode::<OcspRecord>("k", &doc.body).unwrap_err();
        assert!(matches!(err, CertDbError::Corrupted { .. }));
        assert!(err.to_string().contains("文档类型不匹配"));
    }

    #[test]
    fn test_garbage_is_corrupted() {
        let err = decode::<CertificateRecord>("k", "not json").unwrap_err();
        assert!(matches!(err, CertDbError::Corrupted { .. }));

        let err = decode::<CertificateRecord>("k", r#"{"type":"certificate","record":{}}"#)
            .unwrap_err();
        assert!(matches!(err, CertDbError::Corrupted { .. }));
    }
}
