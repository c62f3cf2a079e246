use serde::{Deserialize, Deserializer, Serialize};

use super::repo_types::Role;

/// Request body for login. The web client sends `Password` capitalised.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(alias = "Password")]
    pub password: String,
    pub user_type: Role,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(alias = "Password")]
    pub password: String,
    pub user_type: Role,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login, signup or refresh.
#[derive(Debug, Serialize, Default)]
pub struct AuthResponse {
    pub access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthResponse {
    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            access: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub status: crate::error::ApiStatus,
    pub id: i64,
    pub name: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// `/detail/register` body, discriminated by `usertype`.
#[derive(Debug, Deserialize)]
#[serde(tag = "usertype", rename_all = "lowercase")]
pub enum DetailsRequest {
    #[serde(alias = "Patient")]
    Patient(PatientDetails),
    #[serde(alias = "Doctor")]
    Doctor(DoctorDetails),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDetails {
    pub user_id: i64,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
}

impl PatientDetails {
    /// Name and phone of the emergency contact folded into one column.
    pub fn emergency_contact_line(&self) -> Option<String> {
        match (self.emergency_contact.as_deref(), self.emergency_phone.as_deref()) {
            (Some(name), Some(phone)) if !phone.is_empty() => Some(format!("{name} ({phone})")),
            (Some(name), _) => Some(name.to_string()),
            (None, Some(phone)) => Some(phone.to_string()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DoctorDetails {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(default)]
    pub degree: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub experience: String,
    #[serde(default)]
    pub fees: i32,
    #[serde(default, alias = "specialization")]
    pub speciality: String,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default, alias = "about")]
    pub bio: String,
}

/// Accepts `"5 Years"` as well as `5`.
fn string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(de)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(format!("{n} Years")),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!("unexpected experience value {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_accepts_capitalised_password_field() {
        let req: LoginRequest = serde_json::from_str(
            r#"{"email":"a@b.co","Password":"pw","user_type":"doctor"}"#,
        )
        .unwrap();
        assert_eq!(req.password, "pw");
        assert_eq!(req.user_type, Role::Doctor);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let res = serde_json::from_str::<LoginRequest>(
            r#"{"email":"a@b.co","password":"pw","user_type":"nurse"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn doctor_details_accept_numeric_experience() {
        let req: DetailsRequest = serde_json::from_str(
            r#"{"userId":3,"usertype":"doctor","degree":"MBBS","experience":4,"fees":50,
                "speciality":"Neurologist","phone_number":"555","address_line1":"a",
                "address_line2":"b","bio":"hi"}"#,
        )
        .unwrap();
        match req {
            DetailsRequest::Doctor(d) => {
                assert_eq!(d.user_id, 3);
                assert_eq!(d.experience, "4 Years");
                assert_eq!(d.fees, 50);
            }
            other => panic!("expected doctor details, got {other:?}"),
        }
    }

    #[test]
    fn patient_emergency_contact_is_combined() {
        let req: DetailsRequest = serde_json::from_str(
            r#"{"userId":9,"usertype":"patient","dateOfBirth":"1990-02-01",
                "emergencyContact":"Ann","emergencyPhone":"123"}"#,
        )
        .unwrap();
        let DetailsRequest::Patient(p) = req else { panic!("expected patient") };
        assert_eq!(p.emergency_contact_line().as_deref(), Some("Ann (123)"));
    }

    #[test]
    fn denied_response_omits_identity() {
        let json = serde_json::to_value(AuthResponse::denied("Invalid credentials")).unwrap();
        assert_eq!(json, serde_json::json!({"access": false, "message": "Invalid credentials"}));
    }
}
