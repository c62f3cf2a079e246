use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::PrescriptionView;
use crate::serde_ext;

/// `/prescription/set` body. The web form uses lowercase `patientid`/`doctorid`.
#[derive(Debug, Deserialize)]
pub struct SetPrescriptionRequest {
    #[serde(rename = "appointmentId", deserialize_with = "serde_ext::id")]
    pub appointment_id: i64,
    pub prescription: String,
    #[serde(rename = "patientid", alias = "patientId", deserialize_with = "serde_ext::id")]
    pub patient_id: i64,
    #[serde(rename = "doctorid", alias = "doctorId", deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct FetchPrescriptionsRequest {
    #[serde(rename = "patientId", deserialize_with = "serde_ext::id")]
    pub patient_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PrescriptionItem {
    pub pres_id: i64,
    pub app_id: Option<i64>,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub speciality: String,
    pub prescription: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<PrescriptionView> for PrescriptionItem {
    fn from(v: PrescriptionView) -> Self {
        Self {
            pres_id: v.pres_id,
            app_id: v.app_id,
            doctor_id: v.doctor_id,
            doctor_name: v.doctor_name,
            speciality: v.speciality,
            prescription: v.content,
            created_at: v.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_id_fields_from_the_doctor_form() {
        let req: SetPrescriptionRequest = serde_json::from_str(
            r#"{"appointmentId":4,"prescription":"Paracetamol 500mg","patientid":"9","doctorid":5}"#,
        )
        .unwrap();
        assert_eq!((req.appointment_id, req.patient_id, req.doctor_id), (4, 9, 5));
    }

    #[test]
    fn empty_body_is_rejected() {
        assert!(serde_json::from_str::<SetPrescriptionRequest>("{}").is_err());
    }
}
