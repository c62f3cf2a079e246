use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "allocation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Accepted", alias = "accept")]
    Accepted,
    #[serde(alias = "Rejected", alias = "reject")]
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Bed {
    pub bed_id: i64,
    pub room_number: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct AllocationView {
    pub alloc_id: i64,
    pub bed_id: i64,
    pub room_number: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub alloc_date: Date,
    pub status: AllocationStatus,
    pub app_id: Option<i64>,
}
