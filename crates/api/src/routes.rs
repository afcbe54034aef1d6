use axum::{
    Router,
    routing::{get, post},
};

use crate::auth::BasicAuthLayer;
use crate::health;
use crate::report::ReportApi;
use crate::state::AppState;

pub async fn routes(app_state: AppState) -> Router<AppState> {
    // Everything under /reports requires the operator credentials; crash
    // submission and the health probes do not.
    let protected = Router::new()
        .route("/reports", get(ReportApi::list))
        .route(
            "/reports/{id}",
            get(ReportApi::get)
                .patch(ReportApi::toggle)
                .delete(ReportApi::delete),
        )
        .route("/reports/{id}/dump", get(ReportApi::dump))
        .layer(BasicAuthLayer::new(app_state));

    Router::new()
        .route("/", post(ReportApi::ingest))
        .route("/live", get(health::live))
        .route("/ready", get(health::ready))
        .merge(protected)
}
