//! Booking guard: the ordered checks that must pass before an appointment row
//! is written, and the PostgreSQL store that runs them in one SERIALIZABLE
//! transaction.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use time::{Date, PrimitiveDateTime};
use tracing::{info, warn};

use super::repo;
use crate::db::{is_conflict, is_foreign_key_violation};
use crate::error::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRequest {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub slot: PrimitiveDateTime,
}

impl BookingRequest {
    pub fn day(&self) -> Date {
        self.slot.date()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookingRejection {
    #[error("Doctor is currently not accepting appointments")]
    DoctorBlocked,
    #[error("Doctor has reached the appointment limit for this day")]
    DailyLimitReached,
    #[error("Doctor is unavailable on the selected date")]
    DateBlocked,
    #[error("Duplicate booking: this appointment already exists")]
    Duplicate,
    #[error("This time slot is already booked")]
    SlotTaken,
    #[error("Unknown doctor or patient")]
    UnknownParty,
}

/// Reads and writes the booking guard needs. Implementations decide the
/// transactional scope; [`PgBookingStore`] runs everything in one transaction.
#[async_trait]
pub trait BookingStore: Send {
    async fn doctor_blocked(&mut self, doctor_id: i64) -> anyhow::Result<bool>;
    /// Configured daily cap, if any.
    async fn appointment_limit(&mut self, doctor_id: i64) -> anyhow::Result<Option<i32>>;
    async fn appointments_on(&mut self, doctor_id: i64, day: Date) -> anyhow::Result<i64>;
    async fn date_blocked(&mut self, doctor_id: i64, day: Date) -> anyhow::Result<bool>;
    async fn booking_exists(&mut self, req: &BookingRequest) -> anyhow::Result<bool>;
    async fn insert(&mut self, req: &BookingRequest) -> anyhow::Result<i64>;
}

/// Runs the checks in order and inserts only if every one passes.
/// A limit of zero or below means the doctor has no daily cap.
pub async fn guard_and_insert<S: BookingStore + ?Sized>(
    store: &mut S,
    req: &BookingRequest,
) -> anyhow::Result<Result<i64, BookingRejection>> {
    if store.doctor_blocked(req.doctor_id).await? {
        return Ok(Err(BookingRejection::DoctorBlocked));
    }

    if let Some(limit) = store.appointment_limit(req.doctor_id).await?.filter(|l| *l > 0) {
        let booked = store.appointments_on(req.doctor_id, req.day()).await?;
        if booked >= i64::from(limit) {
            return Ok(Err(BookingRejection::DailyLimitReached));
        }
    }

    if store.date_blocked(req.doctor_id, req.day()).await? {
        return Ok(Err(BookingRejection::DateBlocked));
    }

    if store.booking_exists(req).await? {
        return Ok(Err(BookingRejection::Duplicate));
    }

    Ok(Ok(store.insert(req).await?))
}

pub struct PgBookingStore {
    tx: Transaction<'static, Postgres>,
    referred: bool,
}

/// Switches a fresh transaction to SERIALIZABLE. Must run before any other
/// statement in `tx`.
pub async fn serializable(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut **tx)
        .await
        .context("set booking isolation")?;
    Ok(())
}

impl PgBookingStore {
    pub async fn begin(db: &PgPool) -> anyhow::Result<Self> {
        let mut tx = db.begin().await.context("begin booking tx")?;
        serializable(&mut tx).await?;
        Ok(Self { tx, referred: false })
    }

    /// Runs the guard inside a transaction the caller already opened with
    /// [`serializable`]. Rows it inserts are flagged `referred`.
    pub fn for_referral(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx, referred: true }
    }

    /// Hands the transaction back so the caller decides when to commit.
    pub fn into_tx(self) -> Transaction<'static, Postgres> {
        self.tx
    }

    pub async fn commit(self) -> anyhow::Result<()> {
        self.tx.commit().await.context("commit booking tx")
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn doctor_blocked(&mut self, doctor_id: i64) -> anyhow::Result<bool> {
        let blocked = sqlx::query_scalar::<_, bool>(
            "SELECT blocked FROM doctor_limits WHERE doctor_id = $1",
        )
        .bind(doctor_id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("check doctor blocked")?;
        Ok(blocked.unwrap_or(false))
    }

    async fn appointment_limit(&mut self, doctor_id: i64) -> anyhow::Result<Option<i32>> {
        let limit = sqlx::query_scalar::<_, i32>(
            "SELECT appointment_limit FROM doctor_limits WHERE doctor_id = $1",
        )
        .bind(doctor_id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("load appointment limit")?;
        Ok(limit)
    }

    async fn appointments_on(&mut self, doctor_id: i64, day: Date) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM appointments
             WHERE doctor_id = $1 AND scheduled_at::date = $2
            "#,
        )
        .bind(doctor_id)
        .bind(day)
        .fetch_one(&mut *self.tx)
        .await
        .context("count appointments on day")?;
        Ok(count)
    }

    async fn date_blocked(&mut self, doctor_id: i64, day: Date) -> anyhow::Result<bool> {
        let hit = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM blocked_dates WHERE doctor_id = $1 AND block_date = $2
            )
            "#,
        )
        .bind(doctor_id)
        .bind(day)
        .fetch_one(&mut *self.tx)
        .await
        .context("check blocked date")?;
        Ok(hit)
    }

    async fn booking_exists(&mut self, req: &BookingRequest) -> anyhow::Result<bool> {
        let hit = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM appointments
                 WHERE doctor_id = $1 AND patient_id = $2 AND scheduled_at = $3
            )
            "#,
        )
        .bind(req.doctor_id)
        .bind(req.patient_id)
        .bind(req.slot)
        .fetch_one(&mut *self.tx)
        .await
        .context("check duplicate booking")?;
        Ok(hit)
    }

    async fn insert(&mut self, req: &BookingRequest) -> anyhow::Result<i64> {
        repo::insert_tx(&mut self.tx, req.doctor_id, req.patient_id, req.slot, self.referred).await
    }
}

/// Books an appointment; rejections come back as [`Outcome::Rejected`].
pub async fn book(db: &PgPool, req: BookingRequest) -> anyhow::Result<Outcome<i64>> {
    let mut store = PgBookingStore::begin(db).await?;
    let checked = guard_and_insert(&mut store, &req).await;
    let result = match checked {
        Ok(Ok(app_id)) => store.commit().await.map(|_| Ok(app_id)),
        other => other,
    };

    match result {
        Ok(Ok(app_id)) => {
            info!(app_id, doctor_id = req.doctor_id, patient_id = req.patient_id, "appointment booked");
            Ok(Outcome::Done(app_id))
        }
        Ok(Err(rejection)) => {
            warn!(doctor_id = req.doctor_id, patient_id = req.patient_id, %rejection, "booking rejected");
            Ok(Outcome::reject(rejection.to_string()))
        }
        Err(e) if is_conflict(&e) => {
            warn!(doctor_id = req.doctor_id, slot = %req.slot, "booking lost a race for the slot");
            Ok(Outcome::reject(BookingRejection::SlotTaken.to_string()))
        }
        Err(e) if is_foreign_key_violation(&e) => Ok(Outcome::reject(BookingRejection::UnknownParty.to_string())),
        Err(e) => Err(e),
    }
}
