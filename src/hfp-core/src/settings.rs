use serde::Deserialize;
use strum::{AsRefStr, Display, EnumString};
use tracing_subscriber::EnvFilter;

pub const ENVIRONMENT_VARIABLE: &str = "APP_ENVIRONMENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    Local,
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PsqlLogStatements {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PsqlSettings {
    pub ip: String,
    pub port: u16,
    pub db_name: Option<String>,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
    pub root_cert: Option<String>,
    pub log_statements: PsqlLogStatements,
}

impl Environment {
    /// Reads the environment from `APP_ENVIRONMENT`, falling back to `Local` if it is unset or
    /// unknown.
    pub fn from_env() -> Environment {
        std::env::var(ENVIRONMENT_VARIABLE)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Environment::Local)
    }

    pub fn runs_migrations(&self) -> bool {
        matches!(self, Environment::Local | Environment::Test)
    }
}

/// Installs the global tracing subscriber, `RUST_LOG` takes precedence over the configured level.
/// Calling this more than once is harmless, only the first subscriber is kept.
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_ref()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
