use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{
    AdminUpdateRequest, AppointmentItem, BookRequest, BookResponse, CancelRequest, PatientRequest,
};
use super::services;
use crate::{
    auth::extractors::AdminUser,
    error::{ApiStatus, AppResult, Envelope, Outcome},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/set/appointments", post(book))
        .route("/appointment/cancel", post(cancel))
        .route("/appointment/patient", post(for_patient))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/appointment/get_all", post(admin_list))
        .route("/admin/appointment/update", post(admin_update))
}

#[instrument(skip(state, payload))]
pub async fn book(
    State(state): State<AppState>,
    Json(payload): Json<BookRequest>,
) -> AppResult<Json<BookResponse>> {
    let resp = match services::book_appointment(&state.db, &payload).await? {
        Outcome::Done(id) => BookResponse {
            status: ApiStatus::Success,
            appointment_id: Some(id),
            message: None,
        },
        Outcome::Rejected(reason) => BookResponse {
            status: ApiStatus::Fail,
            appointment_id: None,
            message: Some(reason),
        },
    };
    Ok(Json(resp))
}

#[instrument(skip(state, payload))]
pub async fn cancel(
    State(state): State<AppState>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<Envelope<()>>> {
    let outcome = services::cancel_appointment(
        &state.db,
        payload.appointment_id,
        payload.doctor_id,
        payload.patient_id,
    )
    .await?;
    Ok(Json(outcome.into()))
}

#[instrument(skip(state, payload))]
pub async fn for_patient(
    State(state): State<AppState>,
    Json(payload): Json<PatientRequest>,
) -> AppResult<Json<Envelope<Vec<AppointmentItem>>>> {
    let items = services::patient_appointments(&state.db, payload.patient_id).await?;
    Ok(Json(Envelope::data(items)))
}

#[instrument(skip_all)]
pub async fn admin_list(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Envelope<Vec<AppointmentItem>>>> {
    Ok(Json(Envelope::data(services::all_appointments(&state.db).await?)))
}

#[instrument(skip_all)]
pub async fn admin_update(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<AdminUpdateRequest>,
) -> AppResult<Json<Envelope<()>>> {
    Ok(Json(services::admin_update(&state.db, &payload).await?.into()))
}
