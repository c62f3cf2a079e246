use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct DoctorLimit {
    pub doctor_id: i64,
    pub refer_limit: i32,
    pub appointment_limit: i32,
    pub blocked: bool,
}

/// Doctor joined with its limits row, for the admin limits page.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LimitedDoctor {
    pub doctor_id: i64,
    pub name: String,
    pub speciality: String,
    pub refer_limit: i32,
    pub appointment_limit: i32,
    pub blocked: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UnlimitedDoctor {
    pub doctor_id: i64,
    pub name: String,
    pub speciality: String,
}

/// Loads and row-locks the doctor's limits so concurrent referrals to the
/// same doctor count pending rows one at a time.
pub async fn lock_tx(tx: &mut Transaction<'_, Postgres>, doctor_id: i64) -> anyhow::Result<Option<DoctorLimit>> {
    let row = sqlx::query_as::<_, DoctorLimit>(
        r#"
        SELECT doctor_id, refer_limit, appointment_limit, blocked
          FROM doctor_limits
         WHERE doctor_id = $1
           FOR UPDATE
        "#,
    )
    .bind(doctor_id)
    .fetch_optional(&mut **tx)
    .await
    .context("load doctor limits")?;
    Ok(row)
}

pub async fn with_limits(db: &PgPool) -> anyhow::Result<Vec<LimitedDoctor>> {
    let rows = sqlx::query_as::<_, LimitedDoctor>(
        r#"
        SELECT d.doctor_id, d.name, d.specialization AS speciality,
               l.refer_limit, l.appointment_limit, l.blocked
          FROM doctor d
          JOIN doctor_limits l ON l.doctor_id = d.doctor_id
         ORDER BY d.doctor_id
        "#,
    )
    .fetch_all(db)
    .await
    .context("list doctors with limits")?;
    Ok(rows)
}

pub async fn without_limits(db: &PgPool) -> anyhow::Result<Vec<UnlimitedDoctor>> {
    let rows = sqlx::query_as::<_, UnlimitedDoctor>(
        r#"
        SELECT d.doctor_id, d.name, d.specialization AS speciality
          FROM doctor d
         WHERE NOT EXISTS (SELECT 1 FROM doctor_limits l WHERE l.doctor_id = d.doctor_id)
         ORDER BY d.doctor_id
        "#,
    )
    .fetch_all(db)
    .await
    .context("list doctors without limits")?;
    Ok(rows)
}

/// Returns `false` if the doctor already has limits.
pub async fn insert(db: &PgPool, doctor_id: i64, refer_limit: i32, appointment_limit: i32) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        INSERT INTO doctor_limits (doctor_id, refer_limit, appointment_limit)
        VALUES ($1, $2, $3)
        ON CONFLICT (doctor_id) DO NOTHING
        "#,
    )
    .bind(doctor_id)
    .bind(refer_limit)
    .bind(appointment_limit)
    .execute(db)
    .await
    .context("insert doctor limits")?;
    Ok(res.rows_affected() == 1)
}

pub async fn update(db: &PgPool, doctor_id: i64, refer_limit: i32, appointment_limit: i32) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE doctor_limits
           SET refer_limit = $2, appointment_limit = $3
         WHERE doctor_id = $1
        "#,
    )
    .bind(doctor_id)
    .bind(refer_limit)
    .bind(appointment_limit)
    .execute(db)
    .await
    .context("update doctor limits")?;
    Ok(res.rows_affected() == 1)
}

/// Blocking a doctor with no limits row creates one with no caps.
pub async fn set_blocked(db: &PgPool, doctor_id: i64, blocked: bool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO doctor_limits (doctor_id, blocked)
        VALUES ($1, $2)
        ON CONFLICT (doctor_id) DO UPDATE SET blocked = EXCLUDED.blocked
        "#,
    )
    .bind(doctor_id)
    .bind(blocked)
    .execute(db)
    .await
    .context("set doctor blocked")?;
    Ok(())
}
