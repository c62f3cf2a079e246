use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::Date;

#[derive(Debug, Clone, FromRow)]
pub struct PatientCard {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn patient_card(db: &PgPool, serial_number: i64) -> anyhow::Result<Option<PatientCard>> {
    let row = sqlx::query_as::<_, PatientCard>(
        r#"
        SELECT patient_id, first_name, last_name, date_of_birth, gender, address, phone_number
          FROM patient
         WHERE serial_number = $1
        "#,
    )
    .bind(serial_number)
    .fetch_optional(db)
    .await
    .context("load patient card")?;
    Ok(row)
}
