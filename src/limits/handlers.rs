use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{BlockRequest, LimitRequest};
use super::repo::{self, LimitedDoctor, UnlimitedDoctor};
use super::services;
use crate::{
    auth::extractors::AdminUser,
    error::{AppResult, Envelope},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/refer/exist", post(with_limits))
        .route("/admin/refer/get", post(without_limits))
        .route("/admin/refer/add", post(add_limit))
        .route("/admin/refer/update", post(update_limit))
        .route("/admin/refer/block", post(block_doctor))
}

#[instrument(skip_all)]
pub async fn with_limits(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Envelope<Vec<LimitedDoctor>>>> {
    Ok(Json(Envelope::data(repo::with_limits(&state.db).await?)))
}

#[instrument(skip_all)]
pub async fn without_limits(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Envelope<Vec<UnlimitedDoctor>>>> {
    Ok(Json(Envelope::data(repo::without_limits(&state.db).await?)))
}

#[instrument(skip_all)]
pub async fn add_limit(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<LimitRequest>,
) -> AppResult<Json<Envelope<()>>> {
    Ok(Json(services::add_limit(&state.db, &payload).await?.into()))
}

#[instrument(skip_all)]
pub async fn update_limit(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<LimitRequest>,
) -> AppResult<Json<Envelope<()>>> {
    Ok(Json(services::update_limit(&state.db, &payload).await?.into()))
}

#[instrument(skip_all)]
pub async fn block_doctor(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<BlockRequest>,
) -> AppResult<Json<Envelope<()>>> {
    let outcome = services::set_blocked(&state.db, payload.doctor_id, payload.block).await?;
    Ok(Json(outcome.into()))
}
