use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted crash submission. The `search` index column derived from
/// `body` lives only in the database and is never selected into this type.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Report {
    pub id: i64,
    pub body: serde_json::Value,
    pub dump: Vec<u8>,
    pub open: bool,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NewReport {
    pub body: serde_json::Value,
    pub dump: Vec<u8>,
}

/// Redacted view of a report for list and detail display: everything except
/// the binary payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReportSummary {
    pub id: i64,
    pub body: serde_json::Value,
    pub open: bool,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ReportSummary {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            body: report.body,
            open: report.open,
            closed_at: report.closed_at,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_drops_the_payload() {
        let report = Report {
            id: 7,
            body: json!({"product": "App", "version": "1.2.3"}),
            dump: b"MDMP".to_vec(),
            open: true,
            closed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let summary = ReportSummary::from(report.clone());
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["body"], report.body);
        assert!(value.get("dump").is_none());
        assert!(value.get("search").is_none());
    }
}
