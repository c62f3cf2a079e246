use serde::{Deserialize, Serialize};

use super::repo_types::{DashboardCounts, Doctor};
use crate::appointments::dto::AppointmentItem;
use crate::error::ApiStatus;
use crate::serde_ext;

/// Doctor card as the frontend asset list expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorAsset {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub image: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub line1: String,
    pub line2: String,
}

impl From<Doctor> for DoctorAsset {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.doctor_id,
            name: d.name,
            image: d.image_name.map(|n| format!("{n}.png")).unwrap_or_default(),
            speciality: d.specialization,
            degree: d.degree,
            experience: d.experience,
            about: d.about,
            fees: d.fees.to_string(),
            address: Address {
                line1: d.add_line1,
                line2: d.add_line2,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub file: String,
    /// Sub directory of the assets root, e.g. `doctor`.
    pub usr: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DoctorRequest {
    #[serde(rename = "doctorId", deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BlockDateRequest {
    #[serde(rename = "doctorId", deserialize_with = "serde_ext::id")]
    pub doctor_id: i64,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct BlockDatesResponse {
    pub status: ApiStatus,
    pub result: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub today: Vec<AppointmentItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> Doctor {
        Doctor {
            doctor_id: 3,
            serial_number: 12,
            name: "Dr. Richard James".into(),
            specialization: "General physician".into(),
            experience: "4 Years".into(),
            degree: "MBBS".into(),
            about: "Committed to care".into(),
            fees: 50,
            add_line1: "17th Cross".into(),
            add_line2: "Circle, Ring Road".into(),
            phone_number: None,
            image_name: Some("doc1".into()),
        }
    }

    #[test]
    fn asset_shape() {
        let json = serde_json::to_value(DoctorAsset::from(doctor())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "_id": 3,
                "name": "Dr. Richard James",
                "image": "doc1.png",
                "speciality": "General physician",
                "degree": "MBBS",
                "experience": "4 Years",
                "about": "Committed to care",
                "fees": "50",
                "address": {"line1": "17th Cross", "line2": "Circle, Ring Road"}
            })
        );
    }

    #[test]
    fn missing_image_is_empty() {
        let mut d = doctor();
        d.image_name = None;
        assert_eq!(DoctorAsset::from(d).image, "");
    }

    #[test]
    fn dashboard_counts_are_flattened() {
        let dash = Dashboard {
            counts: DashboardCounts { pending: 2, complete: 1, total: 3, patients: 2 },
            today: vec![],
        };
        let json = serde_json::to_value(dash).unwrap();
        assert_eq!(json["pending"], 2);
        assert_eq!(json["patients"], 2);
        assert!(json["today"].as_array().unwrap().is_empty());
    }
}
