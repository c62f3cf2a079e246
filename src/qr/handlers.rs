use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{QrQuery, TicketRequest};
use super::services;
use crate::{auth::services::normalize_email, error::AppResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/generate/qr", get(generate_qr))
        .route("/generate/ticket", post(generate_ticket))
}

fn png(body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], body).into_response()
}

#[instrument(skip(state, q))]
pub async fn generate_qr(State(state): State<AppState>, Query(q): Query<QrQuery>) -> AppResult<Response> {
    let email = normalize_email(&q.email);
    let record = services::details_extract(&state.db, &email, &q.key, q.user_type).await?;
    let body = services::qr_png(&record)?;
    services::maybe_save(state.config.qr_output_dir.as_deref(), record.username(), &body).await;
    info!(usertype = ?q.user_type, "qr generated");
    Ok(png(body))
}

#[instrument(skip(state, payload))]
pub async fn generate_ticket(
    State(state): State<AppState>,
    Json(payload): Json<TicketRequest>,
) -> AppResult<Response> {
    let ticket = services::ticket_record(&state.db, payload.appointment_id).await?;
    let body = services::ticket_png(&ticket, state.config.ticket_logo.as_deref()).await?;
    services::maybe_save(
        state.config.qr_output_dir.as_deref(),
        &format!("ticket-{}", ticket.appointment_id),
        &body,
    )
    .await;
    info!(app_id = ticket.appointment_id, "ticket generated");
    Ok(png(body))
}
