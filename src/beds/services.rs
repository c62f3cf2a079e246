use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use super::dto::{AllocateRequest, AllocationItem, BedOverview};
use super::repo::{self, NewAllocation};
use super::repo_types::AllocationStatus;
use crate::dates::parse_date;
use crate::db::{is_foreign_key_violation, is_unique_violation};
use crate::error::{AppError, Outcome};

const BED_TAKEN: &str = "Bed is already allocated for that date";

/// All beds plus the allocations that still hold one.
pub async fn overview(db: &PgPool, date: Option<&str>) -> Result<BedOverview, AppError> {
    let day = date.filter(|d| !d.trim().is_empty()).map(parse_date).transpose()?;
    let beds = repo::list_beds(db).await?;
    let booked = repo::live_allocations(db, day).await?;
    Ok(BedOverview {
        beds,
        booked: booked.into_iter().map(AllocationItem::from).collect(),
    })
}

pub async fn allocate(db: &PgPool, req: &AllocateRequest) -> Result<Outcome<i64>, AppError> {
    let day = parse_date(&req.date)?;

    let mut tx = db.begin().await.context("begin bed allocation tx")?;
    if !repo::lock_bed_tx(&mut tx, req.bed_id).await? {
        return Ok(Outcome::reject("Unknown bed"));
    }
    if repo::bed_taken_tx(&mut tx, req.bed_id, day).await? {
        return Ok(Outcome::reject(BED_TAKEN));
    }

    let new = NewAllocation {
        bed_id: req.bed_id,
        doctor_id: req.doctor_id,
        patient_id: req.patient_id,
        app_id: req.appointment_id,
        day,
    };
    let alloc_id = match repo::insert_tx(&mut tx, &new).await {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => return Ok(Outcome::reject(BED_TAKEN)),
        Err(e) if is_foreign_key_violation(&e) => {
            return Ok(Outcome::reject("Unknown doctor, patient or appointment"))
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await.context("commit bed allocation tx")?;

    info!(alloc_id, bed_id = req.bed_id, %day, "bed requested");
    Ok(Outcome::Done(alloc_id))
}

pub async fn patient_beds(db: &PgPool, patient_id: i64) -> anyhow::Result<Vec<AllocationItem>> {
    let rows = repo::list_for_patient(db, patient_id).await?;
    Ok(rows.into_iter().map(AllocationItem::from).collect())
}

pub async fn all_allocations(db: &PgPool) -> anyhow::Result<Vec<AllocationItem>> {
    let rows = repo::list_all(db).await?;
    Ok(rows.into_iter().map(AllocationItem::from).collect())
}

pub async fn update_status(db: &PgPool, alloc_id: i64, status: AllocationStatus) -> Result<Outcome<()>, AppError> {
    match repo::set_status(db, alloc_id, status).await {
        Ok(true) => {
            info!(alloc_id, ?status, "bed allocation status changed");
            Ok(Outcome::Done(()))
        }
        Ok(false) => Ok(Outcome::reject("Allocation not found")),
        Err(e) if is_unique_violation(&e) => Ok(Outcome::reject(BED_TAKEN)),
        Err(e) => Err(e.into()),
    }
}
