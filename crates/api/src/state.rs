use axum::extract::FromRef;
use std::sync::Arc;

use crate::service::ReportService;
use common::settings::Settings;

#[derive(FromRef, Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
    pub settings: Arc<Settings>,
}
