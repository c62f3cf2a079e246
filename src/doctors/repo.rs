use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use super::repo_types::{DashboardCounts, Doctor, NewDoctorProfile};
use crate::appointments::repo::VIEW_SELECT;
use crate::appointments::repo_types::AppointmentView;

const DOCTOR_COLUMNS: &str = r#"
    doctor_id, serial_number, name, specialization, experience, degree, about,
    fees, add_line1, add_line2, phone_number, image_name
"#;

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Doctor>> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctor ORDER BY doctor_id");
    let rows = sqlx::query_as::<_, Doctor>(&sql)
        .fetch_all(db)
        .await
        .context("list doctors")?;
    Ok(rows)
}

pub async fn find_by_serial(db: &PgPool, serial_number: i64) -> anyhow::Result<Option<Doctor>> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctor WHERE serial_number = $1");
    let row = sqlx::query_as::<_, Doctor>(&sql)
        .bind(serial_number)
        .fetch_optional(db)
        .await
        .context("find doctor by serial number")?;
    Ok(row)
}

/// Inserts a fully described doctor profile for an existing user row.
pub async fn insert_profile_tx(
    tx: &mut Transaction<'_, Postgres>,
    serial_number: i64,
    p: &NewDoctorProfile,
) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO doctor (serial_number, name, specialization, experience, degree, about,
                            fees, add_line1, add_line2, image_name)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING doctor_id
        "#,
    )
    .bind(serial_number)
    .bind(&p.name)
    .bind(&p.specialization)
    .bind(&p.experience)
    .bind(&p.degree)
    .bind(&p.about)
    .bind(p.fees)
    .bind(&p.add_line1)
    .bind(&p.add_line2)
    .bind(&p.image_name)
    .fetch_one(&mut **tx)
    .await
    .context("insert doctor profile")?;
    Ok(id)
}

/// Returns `false` when the date was already blocked.
pub async fn insert_block_date(db: &PgPool, doctor_id: i64, day: Date) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        INSERT INTO blocked_dates (doctor_id, block_date)
        VALUES ($1, $2)
        ON CONFLICT (doctor_id, block_date) DO NOTHING
        "#,
    )
    .bind(doctor_id)
    .bind(day)
    .execute(db)
    .await
    .context("insert blocked date")?;
    Ok(res.rows_affected() == 1)
}

pub async fn block_dates(db: &PgPool, doctor_id: i64) -> anyhow::Result<Vec<Date>> {
    let rows = sqlx::query_scalar::<_, Date>(
        "SELECT block_date FROM blocked_dates WHERE doctor_id = $1 ORDER BY block_date",
    )
    .bind(doctor_id)
    .fetch_all(db)
    .await
    .context("list blocked dates")?;
    Ok(rows)
}

pub async fn dashboard_counts(db: &PgPool, doctor_id: i64) -> anyhow::Result<DashboardCounts> {
    let counts = sqlx::query_as::<_, DashboardCounts>(
        r#"
        SELECT COUNT(*) FILTER (WHERE status = 'pending')  AS pending,
               COUNT(*) FILTER (WHERE status = 'complete') AS complete,
               COUNT(*)                                    AS total,
               COUNT(DISTINCT patient_id)                  AS patients
          FROM appointments
         WHERE doctor_id = $1
        "#,
    )
    .bind(doctor_id)
    .fetch_one(db)
    .await
    .context("dashboard counts")?;
    Ok(counts)
}

pub async fn appointments_on(db: &PgPool, doctor_id: i64, day: Date) -> anyhow::Result<Vec<AppointmentView>> {
    let sql = format!(
        "{VIEW_SELECT} WHERE a.doctor_id = $1 AND a.scheduled_at::date = $2 ORDER BY a.scheduled_at"
    );
    let rows = sqlx::query_as::<_, AppointmentView>(&sql)
        .bind(doctor_id)
        .bind(day)
        .fetch_all(db)
        .await
        .context("list appointments for day")?;
    Ok(rows)
}

pub async fn pending_schedule(db: &PgPool, doctor_id: i64) -> anyhow::Result<Vec<AppointmentView>> {
    let sql = format!(
        "{VIEW_SELECT} WHERE a.doctor_id = $1 AND a.status = 'pending' ORDER BY a.scheduled_at"
    );
    let rows = sqlx::query_as::<_, AppointmentView>(&sql)
        .bind(doctor_id)
        .fetch_all(db)
        .await
        .context("list pending schedule")?;
    Ok(rows)
}
