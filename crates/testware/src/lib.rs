pub mod setup;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use common::settings::{Auth, Settings};
use data::report::{NewReport, Report};
use repos::ReportStore;
use repos::error::RepoError;

pub const TEST_USERNAME: &str = "operator";
pub const TEST_PASSWORD: &str = "hunter2";

/// Settings for in-process tests: static test credentials, everything else
/// default.
pub fn create_settings() -> Arc<Settings> {
    Arc::new(Settings {
        auth: Auth {
            username: TEST_USERNAME.to_string(),
            password: TEST_PASSWORD.to_string(),
        },
        ..Settings::default()
    })
}

/// Pool for tests that need a live Postgres. Returns `None` when no test
/// database is configured so those tests can skip instead of failing.
pub async fn test_pool() -> Option<PgPool> {
    setup::TestSetup::init();

    let url = std::env::var("CRASH_REPORTS_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    match PgPoolOptions::new().max_connections(2).connect(&url).await {
        Ok(pool) => Some(pool),
        Err(err) => {
            eprintln!("skipping database test, connection failed: {err}");
            None
        }
    }
}

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    reports: BTreeMap<i64, Report>,
}

/// In-memory [`ReportStore`] mirroring the Postgres repo's observable
/// behavior: monotonic ids, newest-first listing, idempotent delete.
#[derive(Default)]
pub struct MemoryReportStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn create(&self, report: NewReport) -> Result<Report, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let now = Utc::now();
        let report = Report {
            id: inner.next_id,
            body: report.body,
            dump: report.dump,
            open: true,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn get_all(&self) -> Result<Vec<Report>, RepoError> {
        let inner = self.inner.lock().unwrap();
        let mut reports: Vec<Report> = inner.reports.values().cloned().collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reports)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Report>, RepoError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.reports.get(&id).cloned())
    }

    async fn update(&self, report: &Report) -> Result<Option<Report>, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(stored) = inner.reports.get_mut(&report.id) else {
            return Ok(None);
        };
        stored.open = report.open;
        stored.closed_at = report.closed_at;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn remove(&self, id: i64) -> Result<bool, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.reports.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Store whose every operation fails, for exercising backend-failure paths.
pub struct FailingReportStore;

#[async_trait]
impl ReportStore for FailingReportStore {
    async fn create(&self, _report: NewReport) -> Result<Report, RepoError> {
        Err(RepoError::Other())
    }

    async fn get_all(&self) -> Result<Vec<Report>, RepoError> {
        Err(RepoError::Other())
    }

    async fn get_by_id(&self, _id: i64) -> Result<Option<Report>, RepoError> {
        Err(RepoError::Other())
    }

    async fn update(&self, _report: &Report) -> Result<Option<Report>, RepoError> {
        Err(RepoError::Other())
    }

    async fn remove(&self, _id: i64) -> Result<bool, RepoError> {
        Err(RepoError::Other())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Err(RepoError::Other())
    }
}
