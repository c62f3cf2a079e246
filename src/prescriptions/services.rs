use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use super::dto::{PrescriptionItem, SetPrescriptionRequest};
use super::repo;
use crate::appointments::repo as appointments;
use crate::error::{AppError, Outcome};

/// Files the prescription and completes its appointment, or neither.
pub async fn add_prescription(db: &PgPool, req: &SetPrescriptionRequest) -> Result<Outcome<i64>, AppError> {
    let content = req.prescription.trim();
    if content.is_empty() {
        return Err(AppError::bad_request("prescription must not be empty"));
    }

    let mut tx = db.begin().await.context("begin prescription tx")?;
    let completed =
        appointments::mark_complete_tx(&mut tx, req.appointment_id, req.doctor_id, req.patient_id).await?;
    if !completed {
        return Ok(Outcome::reject("Appointment not found"));
    }
    let pres_id = repo::insert_tx(&mut tx, req.appointment_id, req.doctor_id, req.patient_id, content).await?;
    tx.commit().await.context("commit prescription tx")?;

    info!(pres_id, app_id = req.appointment_id, "prescription filed");
    Ok(Outcome::Done(pres_id))
}

pub async fn patient_prescriptions(db: &PgPool, patient_id: i64) -> anyhow::Result<Vec<PrescriptionItem>> {
    let rows = repo::list_for_patient(db, patient_id).await?;
    Ok(rows.into_iter().map(PrescriptionItem::from).collect())
}
