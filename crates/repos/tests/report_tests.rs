#![cfg(test)]

// These tests need a live Postgres; they skip when neither
// CRASH_REPORTS_TEST_DATABASE_URL nor DATABASE_URL is set.

use chrono::Utc;
use serde_json::json;
use serial_test::serial;
use sqlx::PgPool;

use data::report::NewReport;
use repos::ReportStore;
use repos::report::ReportRepo;
use repos::schema::ensure_schema;
use testware::test_pool;

async fn fresh_store(pool: &PgPool) -> ReportRepo {
    sqlx::raw_sql("DROP TABLE IF EXISTS reports; DROP TABLE IF EXISTS dumps;")
        .execute(pool)
        .await
        .expect("Failed to reset test database");
    ensure_schema(pool).await.expect("Failed to create schema");
    ReportRepo::new(pool.clone())
}

fn new_report(product: &str, dump: &[u8]) -> NewReport {
    NewReport {
        body: json!({ "product": product }),
        dump: dump.to_vec(),
    }
}

#[tokio::test]
#[serial]
async fn create_assigns_id_and_defaults() {
    let Some(pool) = test_pool().await else { return };
    let repo = fresh_store(&pool).await;

    let payload: Vec<u8> = vec![0x4d, 0x44, 0x4d, 0x50, 0x00, 0xff];
    let created = repo
        .create(new_report("App", &payload))
        .await
        .expect("Failed to create report");

    assert!(created.open);
    assert!(created.closed_at.is_none());
    assert_eq!(created.dump, payload);

    let found = repo
        .get_by_id(created.id)
        .await
        .expect("Failed to get report")
        .expect("Created report not found");
    assert_eq!(found.id, created.id);
    assert_eq!(found.body, json!({"product": "App"}));
    assert_eq!(found.dump, payload);

    let missing = repo.get_by_id(created.id + 1000).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[serial]
async fn get_all_is_newest_first() {
    let Some(pool) = test_pool().await else { return };
    let repo = fresh_store(&pool).await;

    for product in ["A", "B", "C"] {
        repo.create(new_report(product, b"MDMP"))
            .await
            .expect("Failed to create report");
    }

    let reports = repo.get_all().await.expect("Failed to list reports");
    assert_eq!(reports.len(), 3);
    for pair in reports.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
#[serial]
async fn update_persists_state_and_refreshes_updated_at() {
    let Some(pool) = test_pool().await else { return };
    let repo = fresh_store(&pool).await;

    let mut report = repo.create(new_report("App", b"MDMP")).await.unwrap();
    report.open = false;
    report.closed_at = Some(Utc::now());

    let updated = repo
        .update(&report)
        .await
        .expect("Failed to update report")
        .expect("Updated report not found");
    assert!(!updated.open);
    assert!(updated.closed_at.is_some());
    assert!(updated.updated_at >= updated.created_at);

    // The payload is untouched by updates.
    assert_eq!(updated.dump, b"MDMP");

    report.id += 1000;
    let missing = repo.update(&report).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[serial]
async fn remove_is_idempotent() {
    let Some(pool) = test_pool().await else { return };
    let repo = fresh_store(&pool).await;

    let report = repo.create(new_report("App", b"MDMP")).await.unwrap();

    assert!(repo.remove(report.id).await.unwrap());
    assert!(!repo.remove(report.id).await.unwrap());
    assert!(repo.get_by_id(report.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn ping_succeeds_on_a_live_pool() {
    let Some(pool) = test_pool().await else { return };
    let repo = fresh_store(&pool).await;

    repo.ping().await.expect("Ping failed");
}
