//! # 关系型数据库后端
//!
//! 证书与 OCSP 响应各占一张表，复合主键 `(serial_number, authority_key_identifier)`。
//! 读-改-写由单条 `UPDATE` 完成，依赖数据库的行级原子性。

mod accessor;
mod models;

pub use accessor::SqlAccessor;
