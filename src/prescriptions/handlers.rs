use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{FetchPrescriptionsRequest, PrescriptionItem, SetPrescriptionRequest};
use super::services;
use crate::{
    error::{AppResult, Envelope},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/prescription/set", post(set_prescription))
        .route("/prescription/fetch", post(fetch_prescriptions))
}

#[instrument(skip(state, payload))]
pub async fn set_prescription(
    State(state): State<AppState>,
    Json(payload): Json<SetPrescriptionRequest>,
) -> AppResult<Json<Envelope<()>>> {
    let outcome = services::add_prescription(&state.db, &payload).await?;
    Ok(Json(outcome.map(|_| ()).into()))
}

#[instrument(skip(state, payload))]
pub async fn fetch_prescriptions(
    State(state): State<AppState>,
    Json(payload): Json<FetchPrescriptionsRequest>,
) -> AppResult<Json<Envelope<Vec<PrescriptionItem>>>> {
    let items = services::patient_prescriptions(&state.db, payload.patient_id).await?;
    Ok(Json(Envelope::data(items)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn blank_prescription_is_a_bad_request() {
        let app = routes().with_state(AppState::fake());
        let resp = app
            .oneshot(
                Request::post("/prescription/set")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"appointmentId":4,"prescription":"   ","patientid":9,"doctorid":5}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
