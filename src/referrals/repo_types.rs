use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "referral_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Accepted", alias = "accept")]
    Accepted,
    #[serde(alias = "Rejected", alias = "reject")]
    Rejected,
}

#[derive(Debug, Clone, FromRow)]
pub struct Referral {
    pub refer_id: i64,
    pub from_doc_id: i64,
    pub to_doc_id: i64,
    pub patient_id: i64,
    pub status: ReferralStatus,
    pub app_id: Option<i64>,
}

/// Referral joined with patient and both doctors for the admin list.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReferralView {
    pub refer_id: i64,
    pub from_doc_id: i64,
    pub from_doc_name: String,
    pub from_speciality: String,
    pub to_doc_id: i64,
    pub to_doc_name: String,
    pub to_speciality: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub description: String,
    pub status: ReferralStatus,
    pub app_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
