use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use serde::Serialize;
use sqlx::PgPool;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};
use tracing::{info, warn};

use super::dto::{QrRecord, TicketRecord};
use super::render::{self, TicketText};
use super::repo;
use crate::appointments::repo as appointments;
use crate::auth::{repo_types::{Role, User}, services::credentials_accepted};
use crate::dates::{format_date, format_time};
use crate::doctors::repo as doctors;
use crate::error::AppError;
use crate::storage::{AssetStore, LocalStore};

const STAMP: &[FormatItem<'static>] =
    format_description!("[year]_[month]_[day]_[hour]_[minute]_[second]");
const ISSUED_AT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Verifies the caller and builds the role specific record the QR encodes.
/// Without an explicit role the stored one is used.
pub async fn details_extract(
    db: &PgPool,
    email: &str,
    password: &str,
    role: Option<Role>,
) -> Result<QrRecord, AppError> {
    let user = User::find_by_email(db, email).await?;
    let role = role.or(user.as_ref().map(|u| u.usertype)).unwrap_or(Role::Patient);
    let user = match user {
        Some(u) if credentials_accepted(Some(&u), password, role) => u,
        _ => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    let record = match user.usertype {
        Role::Doctor => {
            let d = doctors::find_by_serial(db, user.serial_number)
                .await?
                .ok_or_else(|| AppError::NotFound("doctor profile missing".into()))?;
            QrRecord::Doctor {
                doctor_id: d.doctor_id,
                name: d.name,
                specialization: d.specialization,
                phone_number: d.phone_number,
                email: user.email,
                username: user.name,
            }
        }
        Role::Patient => {
            let p = repo::patient_card(db, user.serial_number)
                .await?
                .ok_or_else(|| AppError::NotFound("patient profile missing".into()))?;
            QrRecord::Patient {
                patient_id: p.patient_id,
                first_name: p.first_name,
                last_name: p.last_name,
                date_of_birth: p.date_of_birth.map(format_date),
                gender: p.gender,
                address: p.address,
                phone_number: p.phone_number,
                email: user.email,
                username: user.name,
            }
        }
        Role::Admin => QrRecord::Admin {
            email: user.email,
            username: user.name,
        },
    };
    Ok(record)
}

pub async fn ticket_record(db: &PgPool, app_id: i64) -> Result<TicketRecord, AppError> {
    let app = appointments::find(db, app_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".into()))?;
    let issued_at = OffsetDateTime::now_utc().format(ISSUED_AT).unwrap_or_default();
    Ok(TicketRecord {
        appointment_id: app.app_id,
        patient_id: app.patient_id,
        patient_name: app.patient_name,
        doctor_id: app.doctor_id,
        doctor_name: app.doctor_name,
        speciality: app.speciality,
        date: format_date(app.scheduled_at.date()),
        time: format_time(app.scheduled_at.time()),
        issued_at,
    })
}

pub fn qr_png<T: Serialize>(record: &T) -> anyhow::Result<Vec<u8>> {
    let payload = serde_json::to_vec(record).context("serialize qr record")?;
    render::encode_png(&render::qr_image(&payload)?)
}

pub async fn ticket_png(ticket: &TicketRecord, logo_path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    let logo = match logo_path {
        Some(path) => match tokio::fs::read(path).await {
            Ok(bytes) => Some(render::decode_logo(&bytes)?),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ticket logo unavailable");
                None
            }
        },
        None => None,
    };
    let payload = serde_json::to_vec(ticket).context("serialize ticket")?;
    let lines = ticket_lines(ticket);
    let footer = format!("Issued {}", ticket.issued_at);
    let text = TicketText {
        title: "APPOINTMENT TICKET",
        lines: &lines,
        footer: &footer,
    };
    render::encode_png(&render::ticket_image(&payload, text, logo.as_ref())?)
}

/// Human readable fields printed above the code.
pub fn ticket_lines(ticket: &TicketRecord) -> Vec<String> {
    vec![
        format!("Appointment #{}", ticket.appointment_id),
        format!("Patient: {} (#{})", ticket.patient_name, ticket.patient_id),
        format!("Doctor: {}", ticket.doctor_name),
        format!("Speciality: {}", ticket.speciality),
        format!("Date: {}  Time: {}", ticket.date, ticket.time),
    ]
}

/// `<identifier>-<YYYY_MM_DD_HH_MM_SS>.png`, with the identifier reduced to
/// characters safe in a file name.
pub fn output_name(identifier: &str, at: OffsetDateTime) -> String {
    let safe: String = identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stamp = at.format(STAMP).unwrap_or_default();
    format!("{safe}-{stamp}.png")
}

/// Keeps a copy of a generated image when an output directory is configured.
/// Failures are logged, never returned.
pub async fn maybe_save(output_dir: Option<&Path>, identifier: &str, png: &[u8]) {
    let Some(dir) = output_dir else { return };
    let store = LocalStore::new(dir);
    let name = output_name(identifier, OffsetDateTime::now_utc());
    match store.put_object(&name, Bytes::copy_from_slice(png)).await {
        Ok(()) => info!(file = %name, "image saved"),
        Err(e) => warn!(error = ?e, file = %name, "failed to save image"),
    }
}
