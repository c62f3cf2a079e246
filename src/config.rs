use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Connection parameters persisted in `config/database.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read database config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse database config {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create config dir {}", parent.display()))?;
            }
        }
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body).with_context(|| format!("write database config {}", path.display()))
    }

    /// Options for the server itself, without selecting a database.
    pub fn server_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        self.server_options().database(&self.database)
    }
}

const DEFAULT_DB_CONFIG: &str = "config/database.json";

/// Location of the persisted database config: `HMS_DB_CONFIG` or
/// `config/database.json`. Shared by the server and `hms provision`.
pub fn db_config_path() -> PathBuf {
    db_config_path_from(std::env::var("HMS_DB_CONFIG").ok())
}

fn db_config_path_from(var: Option<String>) -> PathBuf {
    PathBuf::from(var.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| DEFAULT_DB_CONFIG.into()))
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    /// When set, takes precedence over `database`.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub assets_dir: PathBuf,
    pub qr_output_dir: Option<PathBuf>,
    pub ticket_logo: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = DatabaseConfig::load(&db_config_path())?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "hms".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "hms-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        Ok(Self {
            database,
            database_url: std::env::var("DATABASE_URL").ok(),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            assets_dir: PathBuf::from(std::env::var("ASSETS_DIR").unwrap_or_else(|_| "assets".into())),
            qr_output_dir: std::env::var("QR_OUTPUT_DIR").ok().map(PathBuf::from),
            ticket_logo: std::env::var("TICKET_LOGO").ok().map(PathBuf::from),
        })
    }

    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        match &self.database_url {
            Some(url) => url.parse().context("parse DATABASE_URL"),
            None => Ok(self.database.connect_options()),
        }
    }
}
