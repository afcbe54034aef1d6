pub mod error;
pub mod report;
pub mod schema;

use async_trait::async_trait;

use crate::error::RepoError;
use data::report::{NewReport, Report};

/// Storage seam for the report service. The Postgres implementation is
/// [`report::ReportRepo`]; tests inject an in-memory one.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new report with `open = true` and no `closed_at`. Returns
    /// the row as stored, with its assigned id and timestamps.
    async fn create(&self, report: NewReport) -> Result<Report, RepoError>;

    /// All reports, newest first by creation time.
    async fn get_all(&self) -> Result<Vec<Report>, RepoError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Report>, RepoError>;

    /// Persist the mutable fields of an existing report (`open`,
    /// `closed_at`) and refresh `updated_at`. Returns `None` when the id
    /// does not exist. The payload and metadata are immutable after
    /// creation and are never written back.
    async fn update(&self, report: &Report) -> Result<Option<Report>, RepoError>;

    /// Delete a report. Returns whether a row was removed; deleting a
    /// missing id is `Ok(false)`, not an error.
    async fn remove(&self, id: i64) -> Result<bool, RepoError>;

    /// Cheap connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), RepoError>;
}
