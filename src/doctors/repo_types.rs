use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Doctor {
    pub doctor_id: i64,
    pub serial_number: i64,
    pub name: String,
    pub specialization: String,
    pub experience: String,
    pub degree: String,
    pub about: String,
    pub fees: i32,
    pub add_line1: String,
    pub add_line2: String,
    pub phone_number: Option<String>,
    pub image_name: Option<String>,
}

/// Profile fields for a doctor created outside the signup flow.
#[derive(Debug, Clone, Default)]
pub struct NewDoctorProfile {
    pub name: String,
    pub specialization: String,
    pub experience: String,
    pub degree: String,
    pub about: String,
    pub fees: i32,
    pub add_line1: String,
    pub add_line2: String,
    pub image_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct DashboardCounts {
    pub pending: i64,
    pub complete: i64,
    pub total: i64,
    pub patients: i64,
}
