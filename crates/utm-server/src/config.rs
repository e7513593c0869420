//! Server configuration from environment.

use std::env;

/// Signing secret used when `UTM_JWT_SECRET` is unset. Development only.
pub const DEV_JWT_SECRET: &str = "utm-dev-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("UTM_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            database_path: env::var("UTM_DATABASE_PATH")
                .unwrap_or_else(|_| "data/utm.db".to_string()),
            database_max_connections: env::var("UTM_DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(8),
            jwt_secret: env::var("UTM_JWT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            log_format: env::var("UTM_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(LogFormat::Pretty),
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
