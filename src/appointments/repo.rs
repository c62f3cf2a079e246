use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::{Date, PrimitiveDateTime, Time};

use super::repo_types::{Appointment, AppointmentStatus, AppointmentView};

/// Shared projection for [`AppointmentView`] queries.
pub(crate) const VIEW_SELECT: &str = r#"
    SELECT a.app_id, a.patient_id, a.doctor_id, a.scheduled_at, a.status, a.referred,
           d.name AS doctor_name, d.specialization AS speciality,
           trim(p.first_name || ' ' || p.last_name) AS patient_name
      FROM appointments a
      JOIN doctor d ON d.doctor_id = a.doctor_id
      JOIN patient p ON p.patient_id = a.patient_id
"#;

pub async fn find(db: &PgPool, app_id: i64) -> anyhow::Result<Option<AppointmentView>> {
    let sql = format!("{VIEW_SELECT} WHERE a.app_id = $1");
    let row = sqlx::query_as::<_, AppointmentView>(&sql)
        .bind(app_id)
        .fetch_optional(db)
        .await
        .context("find appointment")?;
    Ok(row)
}

pub async fn list_for_patient(db: &PgPool, patient_id: i64) -> anyhow::Result<Vec<AppointmentView>> {
    let sql = format!("{VIEW_SELECT} WHERE a.patient_id = $1 ORDER BY a.scheduled_at DESC");
    let rows = sqlx::query_as::<_, AppointmentView>(&sql)
        .bind(patient_id)
        .fetch_all(db)
        .await
        .context("list appointments for patient")?;
    Ok(rows)
}

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<AppointmentView>> {
    let sql = format!("{VIEW_SELECT} ORDER BY a.scheduled_at DESC, a.app_id DESC");
    let rows = sqlx::query_as::<_, AppointmentView>(&sql)
        .fetch_all(db)
        .await
        .context("list all appointments")?;
    Ok(rows)
}

/// Deletes the appointment only if all three ids match. Returns whether a row went away.
pub async fn delete(db: &PgPool, app_id: i64, doctor_id: i64, patient_id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        DELETE FROM appointments
         WHERE app_id = $1 AND doctor_id = $2 AND patient_id = $3
        "#,
    )
    .bind(app_id)
    .bind(doctor_id)
    .bind(patient_id)
    .execute(db)
    .await
    .context("delete appointment")?;
    Ok(res.rows_affected() == 1)
}

/// Admin override. A `None` time keeps the current time of day.
pub async fn update(
    db: &PgPool,
    app_id: i64,
    doctor_id: i64,
    day: Date,
    time_of_day: Option<Time>,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE appointments
           SET doctor_id = $2,
               scheduled_at = $3::date + COALESCE($4::time, scheduled_at::time),
               status = $5
         WHERE app_id = $1
        "#,
    )
    .bind(app_id)
    .bind(doctor_id)
    .bind(day)
    .bind(time_of_day)
    .bind(status)
    .execute(db)
    .await
    .context("update appointment")?;
    Ok(res.rows_affected() == 1)
}

pub async fn find_tx(tx: &mut Transaction<'_, Postgres>, app_id: i64) -> anyhow::Result<Option<Appointment>> {
    let row = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT app_id, patient_id, doctor_id, scheduled_at, status, referred
          FROM appointments
         WHERE app_id = $1
        "#,
    )
    .bind(app_id)
    .fetch_optional(&mut **tx)
    .await
    .context("find appointment")?;
    Ok(row)
}

pub async fn mark_complete_tx(
    tx: &mut Transaction<'_, Postgres>,
    app_id: i64,
    doctor_id: i64,
    patient_id: i64,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE appointments SET status = 'complete'
         WHERE app_id = $1 AND doctor_id = $2 AND patient_id = $3
        "#,
    )
    .bind(app_id)
    .bind(doctor_id)
    .bind(patient_id)
    .execute(&mut **tx)
    .await
    .context("mark appointment complete")?;
    Ok(res.rows_affected() == 1)
}

pub async fn mark_referred_tx(tx: &mut Transaction<'_, Postgres>, app_id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE appointments SET referred = TRUE WHERE app_id = $1")
        .bind(app_id)
        .execute(&mut **tx)
        .await
        .context("mark appointment referred")?;
    Ok(res.rows_affected() == 1)
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    doctor_id: i64,
    patient_id: i64,
    slot: PrimitiveDateTime,
    referred: bool,
) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO appointments (patient_id, doctor_id, scheduled_at, status, referred)
        VALUES ($1, $2, $3, 'pending', $4)
        RETURNING app_id
        "#,
    )
    .bind(patient_id)
    .bind(doctor_id)
    .bind(slot)
    .bind(referred)
    .fetch_one(&mut **tx)
    .await
    .context("insert appointment")?;
    Ok(id)
}
