use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{AddReferralRequest, UpdateReferralRequest};
use super::repo_types::ReferralView;
use super::services;
use crate::{
    auth::extractors::AdminUser,
    error::{AppResult, Envelope},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/referrals/add", post(add_referral))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/refer_appointments/getall", post(list_referrals))
        .route("/admin/refer_appointments/update_status", post(update_status))
}

#[instrument(skip(state, payload))]
pub async fn add_referral(
    State(state): State<AppState>,
    Json(payload): Json<AddReferralRequest>,
) -> AppResult<Json<Envelope<()>>> {
    let outcome = services::create_referral(&state.db, &payload).await?;
    Ok(Json(outcome.map(|_| ()).into()))
}

#[instrument(skip_all)]
pub async fn list_referrals(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Envelope<Vec<ReferralView>>>> {
    Ok(Json(Envelope::data(services::all_referrals(&state.db).await?)))
}

#[instrument(skip_all)]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<UpdateReferralRequest>,
) -> AppResult<Json<Envelope<()>>> {
    Ok(Json(services::update_status(&state.db, &payload).await?.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::auth::{jwt::JwtKeys, repo_types::Role};

    #[tokio::test]
    async fn doctor_token_cannot_decide_referrals() {
        let state = AppState::fake();
        let token = JwtKeys::from(&state.config.jwt).sign_access(4, Role::Doctor).unwrap();
        let resp = admin_routes()
            .with_state(state)
            .oneshot(
                Request::post("/admin/refer_appointments/update_status")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"referid":1,"status":"accepted"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn pending_is_not_a_decision() {
        let state = AppState::fake();
        let token = JwtKeys::from(&state.config.jwt).sign_access(1, Role::Admin).unwrap();
        let resp = admin_routes()
            .with_state(state)
            .oneshot(
                Request::post("/admin/refer_appointments/update_status")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"referid":1,"status":"pending"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
