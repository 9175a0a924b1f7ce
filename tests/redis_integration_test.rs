//! # Redis 后端集成测试
//!
//! 需要可用的 Redis：`CERTDB_TEST_REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

mod common;

use std::sync::Arc;

use certdb::config::KvConfig;
use certdb::error::RecordKind;
use certdb::kv::{KeyBuilder, KeyScheme, expiry_index_key};
use certdb::{Accessor, AccessorConfig, CertificateStatus, ErrorKind, new_accessor};
use chrono::{Duration, Utc};
use common::{certificate, now, ocsp};

fn redis_uri() -> String {
    std::env::var("CERTDB_TEST_REDIS_URL").expect("需要设置 CERTDB_TEST_REDIS_URL")
}

async fn redis_accessor_in(namespace: &str) -> Arc<dyn Accessor> {
    let config = KvConfig {
        uri: redis_uri(),
        ..KvConfig::memory(namespace)
    };
    new_accessor(&AccessorConfig::Kv(config))
        .await
        .expect("连接 Redis 失败")
}

fn unique_namespace() -> String {
    // 每次运行使用独立命名空间
    format!("certdb-test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn redis_accessor() -> Arc<dyn Accessor> {
    redis_accessor_in(&unique_namespace()).await
}

#[tokio::test]
#[ignore] // 需要 Redis 服务器运行
async fn test_redis_lifecycle() {
    let accessor = redis_accessor().await;
    accessor.ping().await.unwrap();

    accessor
        .insert_certificate(&certificate("A1", "K1", Duration::hours(1)))
        .await
        .unwrap();
    accessor
        .insert_certificate(&certificate("A2", "K1", Duration::hours(-1)))
        .await
        .unwrap();
    let err = accessor
        .insert_certificate(&certificate("A1", "K1", Duration::hours(1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);

    accessor.revoke_certificate("A1", "K1", 1).await.unwrap();
    let revoked = accessor.get_certificate("A1", "K1").await.unwrap().remove(0);
    assert_eq!(revoked.status, CertificateStatus::Revoked);

    let unexpired = accessor.get_unexpired_certificates().await.unwrap();
    assert_eq!(unexpired.len(), 1);
    assert_eq!(unexpired[0].serial, "A1");

    accessor
        .insert_ocsp(&ocsp("A1", "K1", "good", Duration::minutes(10)))
        .await
        .unwrap();
    let expiry = now() + Duration::minutes(20);
    accessor.upsert_ocsp("A1", "K1", "revoked", expiry).await.unwrap();
    let stored = accessor.get_ocsp("A1", "K1").await.unwrap().remove(0);
    assert_eq!(stored.body, "revoked");
    assert_eq!(stored.expiry, expiry);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // 需要 Redis 服务器运行
async fn test_redis_concurrent_revokes() {
    let accessor = redis_accessor().await;
    accessor
        .insert_certificate(&certificate("A1", "K1", Duration::hours(1)))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for reason in 1..=6 {
        let accessor = accessor.clone();
        handles.push(tokio::spawn(async move {
            accessor.revoke_certificate("A1", "K1", reason).await
        }));
    }
    for handle in handles {
        if let Err(err) = handle.await.unwrap() {
            assert_eq!(err.kind(), ErrorKind::Conflict);
        }
    }

    let revoked = accessor.get_certificate("A1", "K1").await.unwrap().remove(0);
    assert!((1..=6).contains(&revoked.reason));
}

#[tokio::test]
#[ignore] // 需要 Redis 服务器运行
async fn test_redis_scan_drops_index_members_without_document() {
    let namespace = unique_namespace();
    let accessor = redis_accessor_in(&namespace).await;
    for serial in ["A1", "A2"] {
        accessor
            .insert_certificate(&certificate(serial, "K1", Duration::hours(1)))
            .await
            .unwrap();
    }

    let client = redis::Client::open(redis_uri()).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let index = expiry_index_key(&namespace, RecordKind::Certificate);
    let gone = KeyBuilder::new(&namespace, KeyScheme::Composite).document(
        RecordKind::Certificate,
        "A2",
        "K1",
    );
    let _: i64 = redis::cmd("DEL").arg(&gone).query_async(&mut conn).await.unwrap();

    let unexpired = accessor.get_unexpired_certificates().await.unwrap();
    assert_eq!(unexpired.len(), 1);
    assert_eq!(unexpired[0].serial, "A1");

    let members: i64 = redis::cmd("ZCARD").arg(&index).query_async(&mut conn).await.unwrap();
    assert_eq!(members, 1);
}
