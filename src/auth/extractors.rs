use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::{Claims, JwtKeys, TokenKind};
use super::repo_types::Role;
use crate::error::AppError;

/// Validated access token of the caller.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::Unauthorized("invalid or expired token".into())
        })?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthorized("access token required".into()));
        }

        Ok(AuthUser(claims))
    }
}

/// An [`AuthUser`] whose token carries the admin role.
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            warn!(serial_number = claims.sub, "non-admin on admin route");
            return Err(AppError::Forbidden("admin access required".into()));
        }
        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::{header, Request, StatusCode};

    fn parts_with(auth: Option<String>) -> Parts {
        let mut req = Request::builder().uri("/admin/bed/get_all");
        if let Some(v) = auth {
            req = req.header(header::AUTHORIZATION, v);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn admin_token_is_accepted() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state).sign_access(1, Role::Admin).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let AdminUser(claims) = AdminUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(claims.sub, 1);
    }

    #[tokio::test]
    async fn doctor_token_is_forbidden_on_admin_routes() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state).sign_access(3, Role::Doctor).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let err = AdminUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn refresh_token_cannot_authenticate() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state).sign_refresh(1, Role::Admin).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with(None);
        let err = AuthUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
