use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use crate::auth::repo_types::{Role, User};

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT serial_number, name, email, password_hash, usertype, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_serial(db: &PgPool, serial_number: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT serial_number, name, email, password_hash, usertype, created_at
            FROM users
            WHERE serial_number = $1
            "#,
        )
        .bind(serial_number)
        .fetch_optional(db)
        .await
        .context("find user by serial number")?;
        Ok(user)
    }

    /// Insert the user row inside an open transaction.
    pub async fn create_tx(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, usertype)
            VALUES ($1, $2, $3, $4)
            RETURNING serial_number, name, email, password_hash, usertype, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&mut **tx)
        .await
        .context("insert user")?;
        Ok(user)
    }

    /// Role-specific profile identifier. Admins are identified by their serial number.
    pub async fn profile_id(db: &PgPool, serial_number: i64, role: Role) -> anyhow::Result<Option<i64>> {
        let sql = match role {
            Role::Admin => return Ok(Some(serial_number)),
            Role::Doctor => "SELECT doctor_id FROM doctor WHERE serial_number = $1",
            Role::Patient => "SELECT patient_id FROM patient WHERE serial_number = $1",
        };
        let id = sqlx::query_scalar::<_, i64>(sql)
            .bind(serial_number)
            .fetch_optional(db)
            .await
            .context("resolve profile id")?;
        Ok(id)
    }
}

pub async fn insert_doctor_profile_tx(
    tx: &mut Transaction<'_, Postgres>,
    serial_number: i64,
    name: &str,
) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO doctor (serial_number, name)
        VALUES ($1, $2)
        RETURNING doctor_id
        "#,
    )
    .bind(serial_number)
    .bind(name)
    .fetch_one(&mut **tx)
    .await
    .context("insert doctor profile")?;
    Ok(id)
}

pub async fn insert_patient_profile_tx(
    tx: &mut Transaction<'_, Postgres>,
    serial_number: i64,
    first_name: &str,
    last_name: &str,
) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO patient (serial_number, first_name, last_name)
        VALUES ($1, $2, $3)
        RETURNING patient_id
        "#,
    )
    .bind(serial_number)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(&mut **tx)
    .await
    .context("insert patient profile")?;
    Ok(id)
}

pub struct PatientDetailsRow<'a> {
    pub date_of_birth: Option<Date>,
    pub gender: Option<&'a str>,
    pub address: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub blood_group: Option<&'a str>,
    pub allergies: Option<&'a str>,
    pub emergency_contact: Option<&'a str>,
}

/// Returns false when no patient has that id.
pub async fn update_patient_details(
    db: &PgPool,
    patient_id: i64,
    d: &PatientDetailsRow<'_>,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE patient
           SET date_of_birth = $2, gender = $3, address = $4, phone_number = $5,
               blood_group = $6, allergies = $7, emergency_contact = $8
         WHERE patient_id = $1
        "#,
    )
    .bind(patient_id)
    .bind(d.date_of_birth)
    .bind(d.gender)
    .bind(d.address)
    .bind(d.phone_number)
    .bind(d.blood_group)
    .bind(d.allergies)
    .bind(d.emergency_contact)
    .execute(db)
    .await
    .context("update patient details")?;
    Ok(res.rows_affected() == 1)
}

pub struct DoctorDetailsRow<'a> {
    pub specialization: &'a str,
    pub experience: &'a str,
    pub degree: &'a str,
    pub about: &'a str,
    pub fees: i32,
    pub add_line1: &'a str,
    pub add_line2: &'a str,
    pub phone_number: Option<&'a str>,
}

pub async fn update_doctor_details(
    db: &PgPool,
    doctor_id: i64,
    d: &DoctorDetailsRow<'_>,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE doctor
           SET specialization = $2, experience = $3, degree = $4, about = $5,
               fees = $6, add_line1 = $7, add_line2 = $8, phone_number = $9
         WHERE doctor_id = $1
        "#,
    )
    .bind(doctor_id)
    .bind(d.specialization)
    .bind(d.experience)
    .bind(d.degree)
    .bind(d.about)
    .bind(d.fees)
    .bind(d.add_line1)
    .bind(d.add_line2)
    .bind(d.phone_number)
    .execute(db)
    .await
    .context("update doctor details")?;
    Ok(res.rows_affected() == 1)
}
