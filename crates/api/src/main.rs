use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use api::routes;
use api::service::ReportService;
use api::state::AppState;
use common::settings::Settings;
use repos::report::ReportRepo;
use repos::schema::ensure_schema;

const DEFAULT_BODY_LIMIT: u64 = 50 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[arg(short = 'C', long, default_value = "config")]
    config_dir: String,
}

struct CrashReportApp {
    settings: Arc<Settings>,
}

impl CrashReportApp {
    fn new(config_dir: &str) -> Self {
        Self {
            settings: Arc::new(
                Settings::with_config_dir(config_dir).expect("Failed to load settings"),
            ),
        }
    }

    async fn run(&self) {
        let _guard = common::init_logging(&self.settings);

        info!("Starting server on port {}", self.settings.server.port);

        let pool = self
            .init_db()
            .await
            .expect("Failed to connect to database");

        // The store must be at the current schema version before any
        // request touches it.
        ensure_schema(&pool)
            .await
            .expect("Failed to prepare database schema");

        let repo = Arc::new(ReportRepo::new(pool));
        let service = Arc::new(ReportService::new(repo));
        let state = AppState {
            service,
            settings: self.settings.clone(),
        };

        let body_limit = self
            .settings
            .server
            .max_dump_size
            .unwrap_or(DEFAULT_BODY_LIMIT) as usize;

        let routes_all = Router::new()
            .merge(routes::routes(state.clone()).await)
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let port = self.settings.server.port;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        if self.settings.server.public_key.is_some() && self.settings.server.private_key.is_some() {
            let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

            let config = RustlsConfig::from_pem(
                self.settings
                    .server
                    .public_key
                    .clone()
                    .unwrap_or_default()
                    .into_bytes(),
                self.settings
                    .server
                    .private_key
                    .clone()
                    .unwrap_or_default()
                    .into_bytes(),
            )
            .await
            .expect("Failed to load TLS key pair");

            axum_server::bind_rustls(addr, config)
                .serve(routes_all.into_make_service())
                .await
                .expect("Server failed");
        } else {
            axum_server::bind(addr)
                .serve(routes_all.into_make_service())
                .await
                .expect("Server failed");
        }
    }

    async fn init_db(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.settings.database.max_connections)
            .connect(&self.settings.database.uri)
            .await
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    CrashReportApp::new(&args.config_dir).run().await;
}
