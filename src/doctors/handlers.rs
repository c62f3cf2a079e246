use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{BlockDateRequest, BlockDatesResponse, Dashboard, DoctorAsset, DoctorRequest, ImageQuery};
use super::services;
use crate::{
    appointments::dto::AppointmentItem,
    error::{ApiStatus, AppResult, Envelope},
    state::AppState,
    storage::LocalStore,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/asset/doctors", get(list_doctors).post(list_doctors))
        .route("/image_file", get(image_file))
        .route("/doc/dashboard", post(dashboard))
        .route("/doc/schedule", post(schedule))
        .route("/doc/block", post(block_date))
        .route("/doc/fetch/blockdate", post(fetch_block_dates))
}

#[instrument(skip(state))]
pub async fn list_doctors(State(state): State<AppState>) -> AppResult<Json<Vec<DoctorAsset>>> {
    Ok(Json(services::list_assets(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn image_file(
    State(state): State<AppState>,
    Query(q): Query<ImageQuery>,
) -> AppResult<Response> {
    let store = LocalStore::new(&state.config.assets_dir);
    let (body, mime) = services::load_image(&store, &q.file, q.usr.as_deref()).await?;
    Ok(([(header::CONTENT_TYPE, mime)], body).into_response())
}

#[instrument(skip(state, payload))]
pub async fn dashboard(
    State(state): State<AppState>,
    Json(payload): Json<DoctorRequest>,
) -> AppResult<Json<Envelope<Dashboard>>> {
    Ok(Json(Envelope::data(services::dashboard(&state.db, payload.doctor_id).await?)))
}

#[instrument(skip(state, payload))]
pub async fn schedule(
    State(state): State<AppState>,
    Json(payload): Json<DoctorRequest>,
) -> AppResult<Json<Envelope<Vec<AppointmentItem>>>> {
    Ok(Json(Envelope::data(services::schedule(&state.db, payload.doctor_id).await?)))
}

#[instrument(skip(state, payload))]
pub async fn block_date(
    State(state): State<AppState>,
    Json(payload): Json<BlockDateRequest>,
) -> AppResult<Json<Envelope<()>>> {
    let outcome = services::block_date(&state.db, payload.doctor_id, &payload.date).await?;
    Ok(Json(outcome.into()))
}

#[instrument(skip(state, payload))]
pub async fn fetch_block_dates(
    State(state): State<AppState>,
    Json(payload): Json<DoctorRequest>,
) -> AppResult<Json<BlockDatesResponse>> {
    let result = services::block_dates(&state.db, payload.doctor_id).await?;
    Ok(Json(BlockDatesResponse {
        status: ApiStatus::Success,
        result,
    }))
}
