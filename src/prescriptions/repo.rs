use anyhow::Context;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;

#[derive(Debug, Clone, FromRow)]
pub struct PrescriptionView {
    pub pres_id: i64,
    pub app_id: Option<i64>,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub speciality: String,
    pub content: String,
    pub created_at: OffsetDateTime,
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    app_id: i64,
    doctor_id: i64,
    patient_id: i64,
    content: &str,
) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO prescriptions (patient_id, doctor_id, app_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING pres_id
        "#,
    )
    .bind(patient_id)
    .bind(doctor_id)
    .bind(app_id)
    .bind(content)
    .fetch_one(&mut **tx)
    .await
    .context("insert prescription")?;
    Ok(id)
}

pub async fn list_for_patient(db: &PgPool, patient_id: i64) -> anyhow::Result<Vec<PrescriptionView>> {
    let rows = sqlx::query_as::<_, PrescriptionView>(
        r#"
        SELECT p.pres_id, p.app_id, p.doctor_id, d.name AS doctor_name,
               d.specialization AS speciality, p.content, p.created_at
          FROM prescriptions p
          JOIN doctor d ON d.doctor_id = p.doctor_id
         WHERE p.patient_id = $1
         ORDER BY p.created_at DESC, p.pres_id DESC
        "#,
    )
    .bind(patient_id)
    .fetch_all(db)
    .await
    .context("list prescriptions for patient")?;
    Ok(rows)
}
