//! # Entity 模块
//!
//! 证书与 OCSP 响应表的 Sea-ORM 实体定义

pub mod certificates;
pub mod ocsp_responses;

pub use certificates::Entity as Certificates;
pub use ocsp_responses::Entity as OcspResponses;
