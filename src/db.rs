use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

/// SQLSTATE for unique_violation.
pub const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for foreign_key_violation.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE for serialization_failure.
pub const SERIALIZATION_FAILURE: &str = "40001";

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let options = config.connect_options()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(pool)
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Returns the SQLSTATE of a database error buried in an `anyhow` chain.
pub fn sqlstate(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| match cause.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(dbe)) => dbe.code().map(|c| c.into_owned()),
        _ => None,
    })
}

pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    sqlstate(err).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

/// True for errors the booking transaction reports as a lost race.
pub fn is_conflict(err: &anyhow::Error) -> bool {
    matches!(sqlstate(err).as_deref(), Some(UNIQUE_VIOLATION) | Some(SERIALIZATION_FAILURE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_have_no_sqlstate() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(sqlstate(&err), None);
        assert!(!is_conflict(&err));

        let err = anyhow::Error::new(sqlx::Error::RowNotFound).context("load appointment");
        assert_eq!(sqlstate(&err), None);
        assert!(!is_unique_violation(&err));
    }
}
