use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::ApiError;
use data::report::{NewReport, Report, ReportSummary};
use repos::ReportStore;

/// Form field carrying the minidump in a crash submission. Electron's crash
/// reporter and Breakpad-style clients both use this name.
pub const DUMP_FIELD: &str = "upload_file_minidump";

pub const DUMP_CONTENT_TYPE: &str = "application/x-dmp";

/// Lifecycle and redaction rules on top of a [`ReportStore`]. The store is
/// injected; the service never touches SQL.
pub struct ReportService {
    store: Arc<dyn ReportStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn ReportStore>) -> ReportService {
        ReportService { store }
    }

    /// Persist a submission. The payload must be present (it may be empty);
    /// a stray metadata entry named after the payload field is dropped so it
    /// can never land in `body`.
    pub async fn ingest(
        &self,
        mut fields: Map<String, Value>,
        dump: Option<Vec<u8>>,
    ) -> Result<Report, ApiError> {
        let Some(dump) = dump else {
            return Err(ApiError::Validation(format!("missing {DUMP_FIELD} field")));
        };
        fields.remove(DUMP_FIELD);

        let report = self
            .store
            .create(NewReport {
                body: Value::Object(fields),
                dump,
            })
            .await?;
        info!(report_id = report.id, "ingested crash report");
        Ok(report)
    }

    /// All reports, newest first, without payload or index fields.
    pub async fn list_summaries(&self) -> Result<Vec<ReportSummary>, ApiError> {
        let reports = self.store.get_all().await?;
        Ok(reports.into_iter().map(ReportSummary::from).collect())
    }

    pub async fn get_summary(&self, id: i64) -> Result<ReportSummary, ApiError> {
        self.store
            .get_by_id(id)
            .await?
            .map(ReportSummary::from)
            .ok_or(ApiError::ReportNotFound())
    }

    /// Flip the lifecycle flag: closing stamps `closed_at`, reopening clears
    /// it. Returns the full report; this is an operator-facing mutation, not
    /// a redacted view.
    pub async fn toggle_open_state(&self, id: i64) -> Result<Report, ApiError> {
        let mut report = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(ApiError::ReportNotFound())?;

        report.closed_at = if report.open { Some(Utc::now()) } else { None };
        report.open = !report.open;

        self.store
            .update(&report)
            .await?
            .ok_or(ApiError::ReportNotFound())
    }

    pub async fn remove(&self, id: i64) -> Result<bool, ApiError> {
        Ok(self.store.remove(id).await?)
    }

    /// Payload bytes plus the suggested download filename.
    pub async fn get_dump(&self, id: i64) -> Result<(Vec<u8>, String), ApiError> {
        let report = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(ApiError::ReportNotFound())?;
        Ok((report.dump, format!("crash-{id}.dmp")))
    }

    pub async fn ping(&self) -> Result<(), ApiError> {
        Ok(self.store.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use testware::MemoryReportStore;

    fn service() -> ReportService {
        ReportService::new(Arc::new(MemoryReportStore::new()))
    }

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn ingest_requires_a_payload() {
        let service = service();

        let err = service
            .ingest(fields(json!({"product": "App"})), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // Nothing was created.
        assert!(service.list_summaries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ingest_accepts_an_empty_payload() {
        let service = service();

        let report = service
            .ingest(fields(json!({})), Some(Vec::new()))
            .await
            .unwrap();
        assert!(report.dump.is_empty());

        let (bytes, _) = service.get_dump(report.id).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn ingest_strips_the_payload_field_from_metadata() {
        let service = service();

        let report = service
            .ingest(
                fields(json!({"product": "App", DUMP_FIELD: "bogus"})),
                Some(b"MDMP".to_vec()),
            )
            .await
            .unwrap();

        assert!(report.open);
        assert!(report.closed_at.is_none());
        assert_eq!(report.body, json!({"product": "App"}));
    }

    #[tokio::test]
    async fn toggle_keeps_open_and_closed_at_in_step() {
        let service = service();
        let report = service
            .ingest(fields(json!({})), Some(b"MDMP".to_vec()))
            .await
            .unwrap();
        assert!(report.open && report.closed_at.is_none());

        let closed = service.toggle_open_state(report.id).await.unwrap();
        assert!(!closed.open);
        assert!(closed.closed_at.is_some());

        let reopened = service.toggle_open_state(report.id).await.unwrap();
        assert!(reopened.open);
        assert!(reopened.closed_at.is_none());
    }

    #[tokio::test]
    async fn toggle_unknown_report_is_not_found() {
        let err = service().toggle_open_state(42).await.unwrap_err();
        assert!(matches!(err, ApiError::ReportNotFound()));
    }

    #[tokio::test]
    async fn dump_round_trips_byte_for_byte() {
        let service = service();
        let payload = vec![0u8, 1, 2, 255, 0, 128];
        let report = service
            .ingest(fields(json!({})), Some(payload.clone()))
            .await
            .unwrap();

        let (bytes, filename) = service.get_dump(report.id).await.unwrap();
        assert_eq!(bytes, payload);
        assert_eq!(filename, format!("crash-{}.dmp", report.id));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let service = service();
        let report = service
            .ingest(fields(json!({})), Some(b"MDMP".to_vec()))
            .await
            .unwrap();

        assert!(service.remove(report.id).await.unwrap());
        assert!(!service.remove(report.id).await.unwrap());

        let err = service.get_summary(report.id).await.unwrap_err();
        assert!(matches!(err, ApiError::ReportNotFound()));
    }

    #[tokio::test]
    async fn summaries_are_newest_first() {
        let service = service();
        for product in ["A", "B", "C"] {
            service
                .ingest(fields(json!({"product": product})), Some(b"MDMP".to_vec()))
                .await
                .unwrap();
        }

        let summaries = service.list_summaries().await.unwrap();
        assert_eq!(summaries.len(), 3);
        for pair in summaries.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
        assert_eq!(summaries[0].body, json!({"product": "C"}));
    }
}
