use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Role stored on every user row; selects which profile table owns the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "Admin")]
    Admin,
    #[serde(alias = "Doctor")]
    Doctor,
    #[serde(alias = "Patient")]
    Patient,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub serial_number: i64,           // primary key, links to the profile row
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub usertype: Role,
    pub created_at: OffsetDateTime,
}

/// A user that passed authentication, with its role-specific profile id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub serial_number: i64,
    pub profile_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}
