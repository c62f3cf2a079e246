use serde::{Deserialize, Serialize};

use crate::auth::repo_types::Role;
use crate::serde_ext;

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    pub email: String,
    pub key: String,
    #[serde(rename = "type")]
    pub user_type: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    #[serde(rename = "appointmentId", deserialize_with = "serde_ext::id")]
    pub appointment_id: i64,
}

/// Identity card data encoded into the QR code, shaped by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "usertype", rename_all = "lowercase")]
pub enum QrRecord {
    Doctor {
        doctor_id: i64,
        name: String,
        specialization: String,
        phone_number: Option<String>,
        email: String,
        username: String,
    },
    Patient {
        patient_id: i64,
        first_name: String,
        last_name: String,
        date_of_birth: Option<String>,
        gender: Option<String>,
        address: Option<String>,
        phone_number: Option<String>,
        email: String,
        username: String,
    },
    Admin {
        email: String,
        username: String,
    },
}

impl QrRecord {
    pub fn username(&self) -> &str {
        match self {
            Self::Doctor { username, .. } | Self::Patient { username, .. } | Self::Admin { username, .. } => {
                username
            }
        }
    }
}

/// Everything printed into an appointment ticket's QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRecord {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub speciality: String,
    pub date: String,
    pub time: String,
    pub issued_at: String,
}
