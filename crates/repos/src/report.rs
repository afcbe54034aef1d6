use async_trait::async_trait;
use sqlx::PgPool;

use crate::ReportStore;
use crate::error::{RepoError, handle_sql_error};
use data::report::{NewReport, Report};

const REPORT_COLUMNS: &str = "id, body, dump, open, closed_at, created_at, updated_at";

/// Postgres-backed report store. Queries list columns explicitly so the
/// `search` index column never leaves the database.
#[derive(Debug, Clone)]
pub struct ReportRepo {
    pool: PgPool,
}

impl ReportRepo {
    pub fn new(pool: PgPool) -> ReportRepo {
        ReportRepo { pool }
    }
}

#[async_trait]
impl ReportStore for ReportRepo {
    async fn create(&self, report: NewReport) -> Result<Report, RepoError> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
                INSERT INTO reports (body, dump)
                VALUES ($1, $2)
                RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(report.body)
        .bind(report.dump)
        .fetch_one(&self.pool)
        .await
        .map_err(handle_sql_error)
    }

    async fn get_all(&self) -> Result<Vec<Report>, RepoError> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
                SELECT {REPORT_COLUMNS}
                FROM reports
                ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(handle_sql_error)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Report>, RepoError> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
                SELECT {REPORT_COLUMNS}
                FROM reports
                WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(handle_sql_error)
    }

    async fn update(&self, report: &Report) -> Result<Option<Report>, RepoError> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
                UPDATE reports
                SET open = $2, closed_at = $3, updated_at = now()
                WHERE id = $1
                RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(report.id)
        .bind(report.open)
        .bind(report.closed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(handle_sql_error)
    }

    async fn remove(&self, id: i64) -> Result<bool, RepoError> {
        sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(handle_sql_error)
            .map(|result| result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(handle_sql_error)
            .map(|_| ())
    }
}
