use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub port: u16,
    pub max_dump_size: Option<u64>,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            port: 8080,
            max_dump_size: None,
            public_key: None,
            private_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Auth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct Logger {
    pub directory: String,
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    pub uri: String,
    pub max_connections: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            uri: "postgres://localhost/crash_reports".into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    pub auth: Auth,
    pub logger: Logger,
    pub database: Database,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config_dir("config")
    }

    pub fn with_config_dir(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
            .add_source(File::with_name(&format!("{config_dir}/{run_mode}")).required(false))
            .add_source(File::with_name(&format!("{config_dir}/local")).required(false))
            .add_source(Environment::default().separator("__"));

        builder.build()?.try_deserialize()
    }
}
