use serde::{Deserialize, Serialize};

use super::repo_types::{AllocationStatus, AllocationView, Bed};
use crate::dates::format_date;
use crate::serde_ext;

#[derive(Debug, Default, Deserialize)]
pub struct BedDetailsRequest {
    #[serde(default)]
    pub date: Option<String>,
}

/// `/bed_request/allocate` body; `currentdoc` is the requesting doctor.
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    #[serde(deserialize_with = "serde_ext::id")]
    pub bed_id: i64,
    #[serde(deserialize_with = "serde_ext::id")]
    pub appointment_id: i64,
    #[serde(deserialize_with = "serde_ext::id")]
    pub patient_id: i64,
    pub date: String,
    #[serde(rename = "currentdoc", deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PatientBedsRequest {
    #[serde(rename = "patientId", deserialize_with = "serde_ext::id")]
    pub patient_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAllocationRequest {
    #[serde(deserialize_with = "serde_ext::id")]
    pub alloc_id: i64,
    pub status: AllocationStatus,
}

#[derive(Debug, Serialize)]
pub struct BedOverview {
    pub beds: Vec<Bed>,
    pub booked: Vec<AllocationItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationItem {
    pub alloc_id: i64,
    pub bed_id: i64,
    pub room_number: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub date: String,
    pub status: AllocationStatus,
    pub app_id: Option<i64>,
}

impl From<AllocationView> for AllocationItem {
    fn from(v: AllocationView) -> Self {
        Self {
            alloc_id: v.alloc_id,
            bed_id: v.bed_id,
            room_number: v.room_number,
            doctor_id: v.doctor_id,
            doctor_name: v.doctor_name,
            patient_id: v.patient_id,
            patient_name: v.patient_name,
            date: format_date(v.alloc_date),
            status: v.status,
            app_id: v.app_id,
        }
    }
}
