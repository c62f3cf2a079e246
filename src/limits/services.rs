use sqlx::PgPool;
use tracing::info;

use super::dto::LimitRequest;
use super::repo;
use crate::db::is_foreign_key_violation;
use crate::error::{AppError, Outcome};

fn validate(req: &LimitRequest) -> Result<(), AppError> {
    if req.refer_limit < 0 || req.appointment_limit < 0 {
        return Err(AppError::bad_request("limits must not be negative"));
    }
    Ok(())
}

fn unknown_doctor<T>(e: anyhow::Error) -> Result<Outcome<T>, AppError> {
    if is_foreign_key_violation(&e) {
        Ok(Outcome::reject("Unknown doctor"))
    } else {
        Err(e.into())
    }
}

pub async fn add_limit(db: &PgPool, req: &LimitRequest) -> Result<Outcome<()>, AppError> {
    validate(req)?;
    match repo::insert(db, req.doctor_id, req.refer_limit, req.appointment_limit).await {
        Ok(true) => {
            info!(doctor_id = req.doctor_id, "limits added");
            Ok(Outcome::Done(()))
        }
        Ok(false) => Ok(Outcome::reject("Limits already set for this doctor")),
        Err(e) => unknown_doctor(e),
    }
}

pub async fn update_limit(db: &PgPool, req: &LimitRequest) -> Result<Outcome<()>, AppError> {
    validate(req)?;
    if repo::update(db, req.doctor_id, req.refer_limit, req.appointment_limit).await? {
        info!(doctor_id = req.doctor_id, "limits updated");
        Ok(Outcome::Done(()))
    } else {
        Ok(Outcome::reject("No limits set for this doctor"))
    }
}

pub async fn set_blocked(db: &PgPool, doctor_id: i64, blocked: bool) -> Result<Outcome<()>, AppError> {
    match repo::set_blocked(db, doctor_id, blocked).await {
        Ok(()) => {
            info!(doctor_id, blocked, "doctor block flag changed");
            Ok(Outcome::Done(()))
        }
        Err(e) => unknown_doctor(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_limits_are_rejected() {
        let req = LimitRequest { doctor_id: 1, refer_limit: -1, appointment_limit: 3 };
        assert!(matches!(validate(&req), Err(AppError::BadRequest(_))));
        let req = LimitRequest { doctor_id: 1, refer_limit: 0, appointment_limit: 0 };
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn only_foreign_key_errors_become_rejections() {
        let res = unknown_doctor::<()>(anyhow::anyhow!("connection reset"));
        assert!(matches!(res, Err(AppError::Internal(_))));
    }
}
