use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Complete", alias = "completed")]
    Complete,
}

#[derive(Debug, Clone, FromRow)]
pub struct Appointment {
    pub app_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: PrimitiveDateTime,
    pub status: AppointmentStatus,
    pub referred: bool,
}

/// Appointment joined with the names the UI shows.
#[derive(Debug, Clone, FromRow)]
pub struct AppointmentView {
    pub app_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: PrimitiveDateTime,
    pub status: AppointmentStatus,
    pub referred: bool,
    pub doctor_name: String,
    pub speciality: String,
    pub patient_name: String,
}
