use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use tracing::{error, instrument};

use crate::error::ApiError;
use crate::service::{DUMP_CONTENT_TYPE, DUMP_FIELD};
use crate::state::AppState;
use data::report::{Report, ReportSummary};

pub struct ReportApi;

/// Path ids arrive as strings; non-numeric input is a client error, not a
/// routing miss.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::InvalidReportId(raw.to_string()))
}

impl ReportApi {
    /// `POST /` — unauthenticated crash submission. The multipart part named
    /// `upload_file_minidump` is the payload; remaining parts become the
    /// metadata body.
    #[instrument(skip(state, multipart))]
    pub async fn ingest(
        State(state): State<AppState>,
        mut multipart: Multipart,
    ) -> Result<Json<Value>, ApiError> {
        let mut fields = Map::new();
        let mut dump: Option<Vec<u8>> = None;

        while let Some(field) = multipart.next_field().await.map_err(|err| {
            error!("failed to read multipart field: {}", err);
            ApiError::Validation("malformed multipart submission".to_string())
        })? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == DUMP_FIELD {
                let bytes = field.bytes().await.map_err(|err| {
                    error!("failed to read minidump field: {}", err);
                    ApiError::Validation("malformed minidump field".to_string())
                })?;
                dump = Some(bytes.to_vec());
            } else {
                let text = field.text().await.map_err(|err| {
                    error!(field = name, "failed to read metadata field: {}", err);
                    ApiError::Validation(format!("malformed field {name}"))
                })?;
                fields.insert(name, Value::String(text));
            }
        }

        state.service.ingest(fields, dump).await?;
        Ok(Json(json!({})))
    }

    /// `GET /reports` — redacted reports, newest first.
    pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ReportSummary>>, ApiError> {
        state.service.list_summaries().await.map(Json)
    }

    /// `GET /reports/{id}` — one redacted report.
    pub async fn get(
        State(state): State<AppState>,
        Path(id): Path<String>,
    ) -> Result<Json<ReportSummary>, ApiError> {
        let id = parse_id(&id)?;
        state.service.get_summary(id).await.map(Json)
    }

    /// `PATCH /reports/{id}` — flip open/closed; responds with the full
    /// report.
    pub async fn toggle(
        State(state): State<AppState>,
        Path(id): Path<String>,
    ) -> Result<Json<Report>, ApiError> {
        let id = parse_id(&id)?;
        state.service.toggle_open_state(id).await.map(Json)
    }

    /// `DELETE /reports/{id}` — idempotent delete.
    pub async fn delete(
        State(state): State<AppState>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, ApiError> {
        let id = parse_id(&id)?;
        let deleted = state.service.remove(id).await?;
        Ok(Json(json!({ "deleted": deleted })))
    }

    /// `GET /reports/{id}/dump` — the raw payload as an attachment.
    pub async fn dump(
        State(state): State<AppState>,
        Path(id): Path<String>,
    ) -> Result<Response, ApiError> {
        let id = parse_id(&id)?;
        let (bytes, filename) = state.service.get_dump(id).await?;

        Ok((
            [
                (header::CONTENT_TYPE, DUMP_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={filename}"),
                ),
            ],
            bytes,
        )
            .into_response())
    }
}
