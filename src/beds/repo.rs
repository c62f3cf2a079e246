use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use super::repo_types::{AllocationStatus, AllocationView, Bed};

const ALLOCATION_SELECT: &str = r#"
    SELECT ba.alloc_id, ba.bed_id, b.room_number,
           ba.doctor_id, d.name AS doctor_name,
           ba.patient_id, trim(p.first_name || ' ' || p.last_name) AS patient_name,
           ba.alloc_date, ba.status, ba.app_id
      FROM bed_allocations ba
      JOIN beds b    ON b.bed_id = ba.bed_id
      JOIN doctor d  ON d.doctor_id = ba.doctor_id
      JOIN patient p ON p.patient_id = ba.patient_id
"#;

pub async fn list_beds(db: &PgPool) -> anyhow::Result<Vec<Bed>> {
    let rows = sqlx::query_as::<_, Bed>("SELECT bed_id, room_number FROM beds ORDER BY bed_id")
        .fetch_all(db)
        .await
        .context("list beds")?;
    Ok(rows)
}

/// Allocations that still hold their bed, optionally for one day only.
pub async fn live_allocations(db: &PgPool, day: Option<Date>) -> anyhow::Result<Vec<AllocationView>> {
    let sql = format!(
        "{ALLOCATION_SELECT} WHERE ba.status <> 'rejected' AND ($1::date IS NULL OR ba.alloc_date = $1) \
         ORDER BY ba.alloc_date, ba.bed_id"
    );
    let rows = sqlx::query_as::<_, AllocationView>(&sql)
        .bind(day)
        .fetch_all(db)
        .await
        .context("list live bed allocations")?;
    Ok(rows)
}

pub async fn list_for_patient(db: &PgPool, patient_id: i64) -> anyhow::Result<Vec<AllocationView>> {
    let sql = format!("{ALLOCATION_SELECT} WHERE ba.patient_id = $1 ORDER BY ba.alloc_date DESC");
    let rows = sqlx::query_as::<_, AllocationView>(&sql)
        .bind(patient_id)
        .fetch_all(db)
        .await
        .context("list bed allocations for patient")?;
    Ok(rows)
}

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<AllocationView>> {
    let sql = format!("{ALLOCATION_SELECT} ORDER BY ba.alloc_date DESC, ba.alloc_id DESC");
    let rows = sqlx::query_as::<_, AllocationView>(&sql)
        .fetch_all(db)
        .await
        .context("list bed allocations")?;
    Ok(rows)
}

/// Row-locks the bed so concurrent allocations of it queue up.
pub async fn lock_bed_tx(tx: &mut Transaction<'_, Postgres>, bed_id: i64) -> anyhow::Result<bool> {
    let hit = sqlx::query_scalar::<_, i64>("SELECT bed_id FROM beds WHERE bed_id = $1 FOR UPDATE")
        .bind(bed_id)
        .fetch_optional(&mut **tx)
        .await
        .context("lock bed")?;
    Ok(hit.is_some())
}

pub async fn bed_taken_tx(tx: &mut Transaction<'_, Postgres>, bed_id: i64, day: Date) -> anyhow::Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM bed_allocations
             WHERE bed_id = $1 AND alloc_date = $2 AND status <> 'rejected'
        )
        "#,
    )
    .bind(bed_id)
    .bind(day)
    .fetch_one(&mut **tx)
    .await
    .context("check bed allocation")?;
    Ok(taken)
}

pub struct NewAllocation {
    pub bed_id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub app_id: i64,
    pub day: Date,
}

pub async fn insert_tx(tx: &mut Transaction<'_, Postgres>, a: &NewAllocation) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO bed_allocations (bed_id, doctor_id, patient_id, alloc_date, status, app_id)
        VALUES ($1, $2, $3, $4, 'pending', $5)
        RETURNING alloc_id
        "#,
    )
    .bind(a.bed_id)
    .bind(a.doctor_id)
    .bind(a.patient_id)
    .bind(a.day)
    .bind(a.app_id)
    .fetch_one(&mut **tx)
    .await
    .context("insert bed allocation")?;
    Ok(id)
}

pub async fn set_status(db: &PgPool, alloc_id: i64, status: AllocationStatus) -> anyhow::Result<bool> {
    let res = sqlx::query("UPDATE bed_allocations SET status = $2 WHERE alloc_id = $1")
        .bind(alloc_id)
        .bind(status)
        .execute(db)
        .await
        .context("update bed allocation status")?;
    Ok(res.rows_affected() == 1)
}
