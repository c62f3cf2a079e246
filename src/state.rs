use crate::config::{AppConfig, DatabaseConfig, JwtConfig};
use crate::db;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config).await?;
        Ok(Self { db, config })
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// State backed by a lazy pool that never connects unless a query runs.
    pub fn fake() -> Self {
        let database = DatabaseConfig {
            host: "localhost".into(),
            user: "postgres".into(),
            password: "postgres".into(),
            port: 5432,
            database: "postgres".into(),
        };

        let db = sqlx::postgres::PgPoolOptions::new().connect_lazy_with(database.connect_options());

        let config = Arc::new(AppConfig {
            database,
            database_url: None,
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            assets_dir: std::env::temp_dir(),
            qr_output_dir: None,
            ticket_logo: None,
        });

        Self { db, config }
    }
}
