use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{
    AllocateRequest, AllocationItem, BedDetailsRequest, BedOverview, PatientBedsRequest,
    UpdateAllocationRequest,
};
use super::services;
use crate::{
    auth::extractors::AdminUser,
    error::{AppResult, Envelope},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bed_request/get_details", post(bed_details))
        .route("/bed_request/allocate", post(allocate))
        .route("/user/beds_details", post(patient_beds))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/bed/get_all", post(all_allocations))
        .route("/admin/bed/update_status", post(update_status))
}

/// The body is optional; without a date every live allocation is returned.
#[instrument(skip(state, payload))]
pub async fn bed_details(
    State(state): State<AppState>,
    payload: Option<Json<BedDetailsRequest>>,
) -> AppResult<Json<Envelope<BedOverview>>> {
    let Json(req) = payload.unwrap_or_default();
    let overview = services::overview(&state.db, req.date.as_deref()).await?;
    Ok(Json(Envelope::data(overview)))
}

#[instrument(skip(state, payload))]
pub async fn allocate(
    State(state): State<AppState>,
    Json(payload): Json<AllocateRequest>,
) -> AppResult<Json<Envelope<()>>> {
    let outcome = services::allocate(&state.db, &payload).await?;
    Ok(Json(outcome.map(|_| ()).into()))
}

#[instrument(skip(state, payload))]
pub async fn patient_beds(
    State(state): State<AppState>,
    Json(payload): Json<PatientBedsRequest>,
) -> AppResult<Json<Envelope<Vec<AllocationItem>>>> {
    Ok(Json(Envelope::data(services::patient_beds(&state.db, payload.patient_id).await?)))
}

#[instrument(skip_all)]
pub async fn all_allocations(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Envelope<Vec<AllocationItem>>>> {
    Ok(Json(Envelope::data(services::all_allocations(&state.db).await?)))
}

#[instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<UpdateAllocationRequest>,
) -> AppResult<Json<Envelope<()>>> {
    let outcome = services::update_status(&state.db, payload.alloc_id, payload.status).await?;
    Ok(Json(outcome.into()))
}
