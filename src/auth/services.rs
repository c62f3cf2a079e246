use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::{
    dto::{DetailsRequest, SignupRequest},
    password::{hash_password, password_matches, MIN_PASSWORD_LEN},
    repo::{self, DoctorDetailsRow, PatientDetailsRow},
    repo_types::{AuthenticatedUser, Role, User},
};
use crate::dates::parse_date;
use crate::db::is_unique_violation;
use crate::error::{AppError, Outcome};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Decides a login attempt against the stored row. Never errors: any
/// mismatch, including a missing row, denies access.
pub fn credentials_accepted(user: Option<&User>, password: &str, role: Role) -> bool {
    match user {
        None => false,
        Some(u) if u.usertype != role => false,
        Some(u) => password_matches(password, &u.password_hash),
    }
}

/// Look up `email` and check `password` and `role`; resolve the profile id on success.
pub async fn authenticate(
    db: &PgPool,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Option<AuthenticatedUser>> {
    let user = User::find_by_email(db, email).await?;
    if !credentials_accepted(user.as_ref(), password, role) {
        warn!(%email, role = role.as_str(), "authentication denied");
        return Ok(None);
    }
    let Some(user) = user else { return Ok(None) };

    let Some(profile_id) = User::profile_id(db, user.serial_number, role).await? else {
        warn!(serial_number = user.serial_number, "user has no profile row");
        return Ok(None);
    };

    Ok(Some(AuthenticatedUser {
        serial_number: user.serial_number,
        profile_id,
        name: user.name,
        email: user.email,
        role,
    }))
}

/// Validates shape only; duplicates are a business rejection, not a 4xx.
pub fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    if !is_valid_email(&req.email) {
        return Err(AppError::bad_request("Invalid email"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("Password too short"));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("Name is required"));
    }
    if req.user_type == Role::Admin {
        return Err(AppError::Forbidden("admin accounts cannot self-register".into()));
    }
    Ok(())
}

/// Splits a display name into (first, last) for the patient table.
pub(crate) fn split_name(name: &str) -> (&str, &str) {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (name, ""),
    }
}

/// Creates the user row and its profile row in one transaction.
pub async fn register(db: &PgPool, req: &SignupRequest) -> anyhow::Result<Outcome<AuthenticatedUser>> {
    if User::find_by_email(db, &req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Ok(Outcome::reject("Email already registered"));
    }

    let hash = hash_password(&req.password)?;
    let name = req.name.trim();

    let mut tx = db.begin().await.context("begin signup tx")?;
    let user = match User::create_tx(&mut tx, name, &req.email, &hash, req.user_type).await {
        Ok(u) => u,
        // lost a race against a concurrent signup with the same email
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %req.email, "email registered concurrently");
            return Ok(Outcome::reject("Email already registered"));
        }
        Err(e) => return Err(e),
    };

    let profile_id = match req.user_type {
        Role::Doctor => repo::insert_doctor_profile_tx(&mut tx, user.serial_number, name).await?,
        Role::Patient => {
            let (first, last) = split_name(name);
            repo::insert_patient_profile_tx(&mut tx, user.serial_number, first, last).await?
        }
        Role::Admin => anyhow::bail!("admin signup must be rejected before register"),
    };
    tx.commit().await.context("commit signup tx")?;

    info!(serial_number = user.serial_number, profile_id, role = req.user_type.as_str(), "user registered");
    Ok(Outcome::Done(AuthenticatedUser {
        serial_number: user.serial_number,
        profile_id,
        name: user.name,
        email: user.email,
        role: user.usertype,
    }))
}

/// Fills in the profile created at signup.
pub async fn register_details(db: &PgPool, req: &DetailsRequest) -> Result<Outcome<()>, AppError> {
    let updated = match req {
        DetailsRequest::Patient(p) => {
            let date_of_birth = p
                .date_of_birth
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(parse_date)
                .transpose()?;
            let emergency = p.emergency_contact_line();
            let row = PatientDetailsRow {
                date_of_birth,
                gender: p.gender.as_deref(),
                address: p.address.as_deref(),
                phone_number: p.phone.as_deref(),
                blood_group: p.blood_group.as_deref(),
                allergies: p.allergies.as_deref(),
                emergency_contact: emergency.as_deref(),
            };
            repo::update_patient_details(db, p.user_id, &row).await?
        }
        DetailsRequest::Doctor(d) => {
            if d.fees < 0 {
                return Err(AppError::bad_request("fees must not be negative"));
            }
            let row = DoctorDetailsRow {
                specialization: &d.speciality,
                experience: &d.experience,
                degree: &d.degree,
                about: &d.bio,
                fees: d.fees,
                add_line1: &d.address_line1,
                add_line2: &d.address_line2,
                phone_number: d.phone_number.as_deref(),
            };
            repo::update_doctor_details(db, d.user_id, &row).await?
        }
    };
    if updated {
        Ok(Outcome::Done(()))
    } else {
        Ok(Outcome::reject("Profile not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn stored(role: Role, password: &str) -> User {
        User {
            serial_number: 1,
            name: "Dr. Richard James".into(),
            email: "richard@example.com".into(),
            password_hash: hash_password(password).unwrap(),
            usertype: role,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn matching_role_and_password_is_accepted() {
        let user = stored(Role::Doctor, "pa55word");
        assert!(credentials_accepted(Some(&user), "pa55word", Role::Doctor));
    }

    #[test]
    fn other_role_is_denied_even_with_correct_password() {
        let user = stored(Role::Doctor, "pa55word");
        assert!(!credentials_accepted(Some(&user), "pa55word", Role::Patient));
        assert!(!credentials_accepted(Some(&user), "pa55word", Role::Admin));
    }

    #[test]
    fn wrong_password_is_denied_for_every_role() {
        for role in [Role::Admin, Role::Doctor, Role::Patient] {
            let user = stored(role, "pa55word");
            assert!(!credentials_accepted(Some(&user), "pa55wordX", role));
        }
    }

    #[test]
    fn unknown_email_is_denied() {
        assert!(!credentials_accepted(None, "anything", Role::Patient));
    }

    #[test]
    fn signup_validation() {
        let mut req = SignupRequest {
            email: "new@example.com".into(),
            password: "secret1".into(),
            user_type: Role::Patient,
            name: "Jane Doe".into(),
        };
        assert!(validate_signup(&req).is_ok());

        req.email = "not-an-email".into();
        assert!(matches!(validate_signup(&req), Err(AppError::BadRequest(_))));

        req.email = "new@example.com".into();
        req.password = "123".into();
        assert!(matches!(validate_signup(&req), Err(AppError::BadRequest(_))));

        req.password = "secret1".into();
        req.user_type = Role::Admin;
        assert!(matches!(validate_signup(&req), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn names_split_on_first_space() {
        assert_eq!(split_name("Jane Doe"), ("Jane", "Doe"));
        assert_eq!(split_name("  Mary Ann  Smith "), ("Mary", "Ann  Smith"));
        assert_eq!(split_name("Cher"), ("Cher", ""));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Foo@Example.COM "), "foo@example.com");
        assert!(is_valid_email("foo@example.com"));
        assert!(!is_valid_email("foo@example"));
    }
}
