use anyhow::Context;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use super::dto::{AddReferralRequest, UpdateReferralRequest};
use super::repo::{self, NewReferral};
use super::repo_types::{ReferralStatus, ReferralView};
use crate::appointments::booking::{self, BookingRejection, BookingRequest, PgBookingStore};
use crate::appointments::repo as appointments;
use crate::db::{is_conflict, is_foreign_key_violation};
use crate::error::{AppError, Outcome};
use crate::limits::repo::{self as limits, DoctorLimit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReferralRejection {
    #[error("Cannot refer a patient to the same doctor")]
    SameDoctor,
    #[error("Referred doctor is currently not accepting referrals")]
    DoctorBlocked,
    #[error("Referred doctor has reached the referral limit")]
    LimitReached,
    #[error("Appointment not found")]
    UnknownAppointment,
    #[error("Unknown doctor or patient")]
    UnknownParty,
}

/// Whether the destination doctor can take one more pending referral.
/// A limit of zero or below means no cap.
pub fn check_capacity(limit: Option<DoctorLimit>, pending: i64) -> Result<(), ReferralRejection> {
    let Some(limit) = limit else {
        return Ok(());
    };
    if limit.blocked {
        return Err(ReferralRejection::DoctorBlocked);
    }
    if limit.refer_limit > 0 && pending >= i64::from(limit.refer_limit) {
        return Err(ReferralRejection::LimitReached);
    }
    Ok(())
}

pub async fn create_referral(db: &PgPool, req: &AddReferralRequest) -> anyhow::Result<Outcome<i64>> {
    if req.from_doctor == req.to_doctor {
        return Ok(Outcome::reject(ReferralRejection::SameDoctor.to_string()));
    }

    let mut tx = db.begin().await.context("begin referral tx")?;

    let limit = limits::lock_tx(&mut tx, req.to_doctor).await?;
    let pending = repo::pending_for_tx(&mut tx, req.to_doctor).await?;
    if let Err(rejection) = check_capacity(limit, pending) {
        warn!(to_doctor = req.to_doctor, %rejection, "referral rejected");
        return Ok(Outcome::reject(rejection.to_string()));
    }

    let origin = appointments::find_tx(&mut tx, req.app_id).await?;
    if !origin.is_some_and(|a| a.doctor_id == req.from_doctor && a.patient_id == req.patient_id) {
        return Ok(Outcome::reject(ReferralRejection::UnknownAppointment.to_string()));
    }

    let new = NewReferral {
        from_doc_id: req.from_doctor,
        to_doc_id: req.to_doctor,
        patient_id: req.patient_id,
        app_id: req.app_id,
        description: req.description.trim(),
    };
    let refer_id = match repo::insert_tx(&mut tx, &new).await {
        Ok(id) => id,
        Err(e) if is_foreign_key_violation(&e) => {
            return Ok(Outcome::reject(ReferralRejection::UnknownParty.to_string()))
        }
        Err(e) => return Err(e),
    };
    appointments::mark_referred_tx(&mut tx, req.app_id).await?;
    tx.commit().await.context("commit referral tx")?;

    info!(refer_id, from = req.from_doctor, to = req.to_doctor, "referral created");
    Ok(Outcome::Done(refer_id))
}

pub async fn all_referrals(db: &PgPool) -> anyhow::Result<Vec<ReferralView>> {
    repo::list_all(db).await
}

/// Rejecting only flips the status. Accepting also books the destination
/// doctor at the originating appointment's time through the booking guard,
/// in the same SERIALIZABLE transaction; a guard rejection leaves the
/// referral pending.
pub async fn update_status(db: &PgPool, req: &UpdateReferralRequest) -> Result<Outcome<()>, AppError> {
    if req.status == ReferralStatus::Pending {
        return Err(AppError::bad_request("status must be accepted or rejected"));
    }

    let mut tx = db.begin().await.context("begin referral status tx")?;
    booking::serializable(&mut tx).await?;
    let Some(referral) = repo::lock_tx(&mut tx, req.refer_id).await? else {
        return Ok(Outcome::reject("Referral not found"));
    };
    if referral.status != ReferralStatus::Pending {
        return Ok(Outcome::reject("Referral has already been decided"));
    }

    repo::set_status_tx(&mut tx, referral.refer_id, req.status).await?;

    if req.status == ReferralStatus::Accepted {
        let origin = match referral.app_id {
            Some(app_id) => appointments::find_tx(&mut tx, app_id).await?,
            None => None,
        };
        let Some(origin) = origin else {
            return Ok(Outcome::reject("Originating appointment no longer exists"));
        };

        let request = BookingRequest {
            doctor_id: referral.to_doc_id,
            patient_id: referral.patient_id,
            slot: origin.scheduled_at,
        };
        let mut store = PgBookingStore::for_referral(tx);
        match booking::guard_and_insert(&mut store, &request).await {
            Ok(Ok(app_id)) => info!(refer_id = referral.refer_id, app_id, "referral accepted"),
            Ok(Err(rejection)) => {
                warn!(refer_id = referral.refer_id, %rejection, "referral acceptance rejected");
                return Ok(Outcome::reject(rejection.to_string()));
            }
            Err(e) if is_conflict(&e) => {
                return Ok(Outcome::reject(BookingRejection::SlotTaken.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        tx = store.into_tx();
    } else {
        info!(refer_id = referral.refer_id, "referral rejected");
    }

    match tx.commit().await.context("commit referral status tx") {
        Ok(()) => Ok(Outcome::Done(())),
        Err(e) if is_conflict(&e) => Ok(Outcome::reject(BookingRejection::SlotTaken.to_string())),
        Err(e) => Err(e.into()),
    }
}
