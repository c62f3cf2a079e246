use sqlx::PgPool;
use tracing::info;

use super::booking::{self, BookingRejection, BookingRequest};
use super::dto::{AdminUpdateRequest, AppointmentItem, BookRequest};
use super::repo;
use crate::dates::{parse_day_and_time, parse_slot};
use crate::db::{is_foreign_key_violation, is_unique_violation};
use crate::error::{AppError, Outcome};

pub async fn book_appointment(db: &PgPool, req: &BookRequest) -> Result<Outcome<i64>, AppError> {
    let slot = parse_slot(&req.date, &req.time)?;
    let outcome = booking::book(
        db,
        BookingRequest {
            doctor_id: req.doctor_id,
            patient_id: req.patient_id,
            slot,
        },
    )
    .await?;
    Ok(outcome)
}

pub async fn cancel_appointment(
    db: &PgPool,
    app_id: i64,
    doctor_id: i64,
    patient_id: i64,
) -> anyhow::Result<Outcome<()>> {
    if repo::delete(db, app_id, doctor_id, patient_id).await? {
        info!(app_id, doctor_id, patient_id, "appointment cancelled");
        Ok(Outcome::Done(()))
    } else {
        Ok(Outcome::reject("Appointment not found"))
    }
}

pub async fn patient_appointments(db: &PgPool, patient_id: i64) -> anyhow::Result<Vec<AppointmentItem>> {
    let rows = repo::list_for_patient(db, patient_id).await?;
    Ok(rows.into_iter().map(AppointmentItem::from).collect())
}

pub async fn all_appointments(db: &PgPool) -> anyhow::Result<Vec<AppointmentItem>> {
    let rows = repo::list_all(db).await?;
    Ok(rows.into_iter().map(AppointmentItem::from).collect())
}

/// Admin override of doctor, timestamp and status. Bypasses the booking
/// guard but not the one-appointment-per-slot constraint.
pub async fn admin_update(db: &PgPool, req: &AdminUpdateRequest) -> Result<Outcome<()>, AppError> {
    let (day, time_of_day) = parse_day_and_time(&req.date)?;
    match repo::update(db, req.app_id, req.doctor_id, day, time_of_day, req.status).await {
        Ok(true) => {
            info!(app_id = req.app_id, status = ?req.status, "appointment updated by admin");
            Ok(Outcome::Done(()))
        }
        Ok(false) => Ok(Outcome::reject("Appointment not found")),
        Err(e) if is_unique_violation(&e) => Ok(Outcome::reject(BookingRejection::SlotTaken.to_string())),
        Err(e) if is_foreign_key_violation(&e) => Ok(Outcome::reject("Unknown doctor")),
        Err(e) => Err(e.into()),
    }
}
