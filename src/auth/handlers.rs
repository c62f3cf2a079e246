use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AdminLoginRequest, AdminLoginResponse, AuthResponse, DetailsRequest, LoginRequest,
            PublicUser, RefreshRequest, SignupRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        repo_types::{AuthenticatedUser, Role, User},
        services::{self, is_valid_email, normalize_email},
    },
    error::{ApiStatus, AppError, AppResult, Envelope, Outcome},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/refresh", post(refresh))
        .route("/admin/login", post(admin_login))
        .route("/detail/register", post(register_details))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn granted(keys: &JwtKeys, user: AuthenticatedUser) -> AppResult<AuthResponse> {
    let pair = keys.sign_pair(user.serial_number, user.role)?;
    Ok(AuthResponse {
        access: true,
        id: Some(user.profile_id),
        name: Some(user.name),
        token: Some(pair.access),
        refresh_token: Some(pair.refresh),
        message: None,
    })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = normalize_email(&payload.email);
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }

    match services::authenticate(&state.db, &payload.email, &payload.password, payload.user_type).await? {
        Some(user) => {
            info!(serial_number = user.serial_number, "user logged in");
            Ok(Json(granted(&JwtKeys::from_ref(&state), user)?))
        }
        None => Ok(Json(AuthResponse::denied("Invalid credentials"))),
    }
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = normalize_email(&payload.email);
    services::validate_signup(&payload)?;

    match services::register(&state.db, &payload).await? {
        Outcome::Done(user) => Ok(Json(granted(&JwtKeys::from_ref(&state), user)?)),
        Outcome::Rejected(reason) => Ok(Json(AuthResponse::denied(reason))),
    }
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> AppResult<Response> {
    let email = normalize_email(&payload.email);
    let Some(admin) = services::authenticate(&state.db, &email, &payload.password, Role::Admin).await? else {
        return Ok(Json(Envelope::fail("Invalid credentials")).into_response());
    };
    let token = JwtKeys::from_ref(&state).sign_access(admin.serial_number, Role::Admin)?;
    info!(serial_number = admin.serial_number, "admin logged in");
    Ok(Json(AdminLoginResponse {
        status: ApiStatus::Success,
        id: admin.profile_id,
        name: admin.name,
        token,
    })
    .into_response())
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_serial(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    let profile_id = User::profile_id(&state.db, user.serial_number, user.usertype)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    let resp = granted(
        &keys,
        AuthenticatedUser {
            serial_number: user.serial_number,
            profile_id,
            name: user.name,
            email: user.email,
            role: user.usertype,
        },
    )?;
    Ok(Json(resp))
}

#[instrument(skip(state, payload))]
pub async fn register_details(
    State(state): State<AppState>,
    Json(payload): Json<DetailsRequest>,
) -> AppResult<Json<Envelope<()>>> {
    let outcome = services::register_details(&state.db, &payload).await?;
    Ok(Json(outcome.into()))
}

#[instrument(skip(state, claims))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_serial(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(PublicUser {
        id: user.serial_number,
        email: user.email,
        name: user.name,
        role: user.usertype,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: 12,
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
            role: Role::Patient,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["role"], "patient");
    }

    #[test]
    fn granted_response_carries_profile_id_and_tokens() {
        let keys = JwtKeys::from(&crate::config::JwtConfig {
            secret: "s".into(),
            issuer: "i".into(),
            audience: "a".into(),
            ttl_minutes: 1,
            refresh_ttl_minutes: 2,
        });
        let resp = granted(
            &keys,
            AuthenticatedUser {
                serial_number: 70,
                profile_id: 5,
                name: "Dr. Emily Larson".into(),
                email: "emily@example.com".into(),
                role: Role::Doctor,
            },
        )
        .unwrap();
        assert!(resp.access);
        assert_eq!(resp.id, Some(5));
        let claims = keys.verify(resp.token.as_deref().unwrap()).unwrap();
        assert_eq!(claims.sub, 70);
    }
}
