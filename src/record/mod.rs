//! # 记录模型
//!
//! 证书与 OCSP 响应的后端无关数据结构。各后端自行负责物理编码。

mod certificate;
mod ocsp;

pub use certificate::{CertificateRecord, CertificateStatus, CrlReason};
pub use ocsp::OcspRecord;
