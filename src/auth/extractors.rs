use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::auth::jwt::{Claims, JwtKeys};
use crate::auth::repo::{User, UserRole};
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "token";

/// Extracts and validates the session token, rejecting the request before
/// the handler runs when no valid token is present.
///
/// Lookup order: `token` cookie, then `Authorization: Bearer`.
pub struct AuthUser(pub Claims);

fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|v| v.trim().to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)
            .ok_or_else(|| ApiError::Auth("unauthenticated, please login".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session token");
            ApiError::Auth("invalid token, please login".into())
        })?;

        Ok(AuthUser(claims))
    }
}

/// Admin gate layered on `AuthUser`: loads the full user record for the
/// token subject and permits only the ADMIN role.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| ApiError::Auth("unauthorized access".into()))?;

        if user.role != UserRole::Admin {
            warn!(user_id = %user.id, "non-admin attempted admin route");
            return Err(ApiError::Auth("unauthorized access".into()));
        }

        Ok(AdminUser(user))
    }
}
