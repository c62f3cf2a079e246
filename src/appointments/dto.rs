use serde::{Deserialize, Serialize};

use super::repo_types::{AppointmentStatus, AppointmentView};
use crate::dates::{format_date, format_time};
use crate::error::ApiStatus;
use crate::serde_ext;

/// `/set/appointments` body. The patient id arrives as `userId`.
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    #[serde(rename = "doctorId", deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
    #[serde(rename = "userId", alias = "patientId", deserialize_with = "serde_ext::id")]
    pub patient_id: i64,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub status: ApiStatus,
    #[serde(rename = "appointmentId", skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(deserialize_with = "serde_ext::id")]
    pub appointment_id: i64,
    #[serde(deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
    #[serde(deserialize_with = "serde_ext::id")]
    pub patient_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PatientRequest {
    #[serde(rename = "patientId", deserialize_with = "serde_ext::id")]
    pub patient_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdminUpdateRequest {
    #[serde(deserialize_with = "serde_ext::id")]
    pub app_id: i64,
    #[serde(deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
    /// `YYYY-MM-DD`, optionally followed by a time of day.
    pub date: String,
    pub status: AppointmentStatus,
}

/// Appointment row as the dashboards render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentItem {
    pub app_id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub doctor_name: String,
    pub speciality: String,
    pub patient_name: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub referred: bool,
}

impl From<AppointmentView> for AppointmentItem {
    fn from(v: AppointmentView) -> Self {
        Self {
            app_id: v.app_id,
            doctor_id: v.doctor_id,
            patient_id: v.patient_id,
            doctor_name: v.doctor_name,
            speciality: v.speciality,
            patient_name: v.patient_name,
            date: format_date(v.scheduled_at.date()),
            time: format_time(v.scheduled_at.time()),
            status: v.status,
            referred: v.referred,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn booking_body_from_web_form() {
        let req: BookRequest = serde_json::from_str(
            r#"{"doctorId":"5","userId":9,"date":"2024-01-10","time":"10:00"}"#,
        )
        .unwrap();
        assert_eq!((req.doctor_id, req.patient_id), (5, 9));
    }

    #[test]
    fn booked_response_shapes() {
        let ok = BookResponse {
            status: ApiStatus::Success,
            appointment_id: Some(42),
            message: None,
        };
        assert_eq!(
            serde_json::to_value(ok).unwrap(),
            serde_json::json!({"status": "success", "appointmentId": 42})
        );
    }

    #[test]
    fn item_splits_timestamp() {
        let item = AppointmentItem::from(AppointmentView {
            app_id: 1,
            patient_id: 9,
            doctor_id: 5,
            scheduled_at: datetime!(2024-01-10 10:00),
            status: AppointmentStatus::Pending,
            referred: false,
            doctor_name: "Dr. Grey".into(),
            speciality: "Neurologist".into(),
            patient_name: "Ann Lee".into(),
        });
        assert_eq!(item.date, "2024-01-10");
        assert_eq!(item.time, "10:00");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "pending");
    }
}
