use serde::Deserialize;

use super::repo_types::ReferralStatus;
use crate::serde_ext;

/// `/referrals/add` body. `doctor_id` is the destination, `currentdoc` the
/// referring doctor.
#[derive(Debug, Deserialize)]
pub struct AddReferralRequest {
    #[serde(rename = "doctor_id", deserialize_with = "serde_ext::id")]
    pub to_doctor: i64,
    #[serde(deserialize_with = "serde_ext::id")]
    pub app_id: i64,
    #[serde(deserialize_with = "serde_ext::id")]
    pub patient_id: i64,
    #[serde(rename = "currentdoc", deserialize_with = "serde_ext::id")]
    pub from_doctor: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReferralRequest {
    #[serde(rename = "referid", alias = "refer_id", deserialize_with = "serde_ext::id")]
    pub refer_id: i64,
    pub status: ReferralStatus,
}
