use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{is_valid_email, ForgetPasswordRequest, LoginRequest, RegisterForm, SendOtpRequest,
              UpdateUserForm},
        extractors::{AdminUser, AuthUser, SESSION_COOKIE},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{NewUser, User},
    },
    error::{ApiError, ApiResponse},
    media,
    otp::{self, repo::Otp},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/otp", post(send_otp))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forget-password", post(forget_password))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB, avatar uploads
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user_profile).patch(update_user))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}

fn session_cookie(token: &str, ttl_days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .secure(true)
        .path("/")
        .max_age(time::Duration::days(ttl_days))
        .build()
}

fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(true)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

#[instrument(skip(state, payload))]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<ApiResponse<Otp>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::Validation("email is required".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("invalid email".into()));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "otp requested for registered email");
        return Err(ApiError::Conflict(
            "email already registered, please log in".into(),
        ));
    }

    let otp = otp::service::issue(&state, &email).await?;
    Ok(ApiResponse::created(otp, "OTP sent successfully"))
}

#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<ApiResponse<User>, ApiError> {
    let form = RegisterForm::from_multipart(mp).await?;
    form.validate()?;
    let avatar = form
        .avatar
        .as_ref()
        .ok_or_else(|| ApiError::Validation("avatar file is required".into()))?;

    // Duplicate email wins over OTP validity; the unique index backstops
    // this pre-check under concurrent registrations.
    if User::find_by_email(&state.db, &form.email).await?.is_some() {
        warn!(email = %form.email, "email already registered");
        return Err(ApiError::Conflict("email already exists".into()));
    }

    otp::service::verify(&state, &form.email, &form.otp).await?;

    let hash = hash_password(&form.password)?;
    let user = User::create(
        &state.db,
        &NewUser {
            first_name: &form.first_name,
            last_name: &form.last_name,
            email: &form.email,
            phone: &form.phone,
            password_hash: &hash,
            answer: &form.answer,
            avatar_id: &state.config.avatar_placeholder_id,
            avatar_url: &state.config.avatar_placeholder_url,
        },
    )
    .await?;

    // The row starts on the placeholder; a failed upload leaves it there.
    let stored = media::upload_avatar(&state, user.id, avatar)
        .await
        .map_err(|e| ApiError::Upstream(format!("avatar upload failed: {e}")))?;
    let user = User::set_avatar(&state.db, user.id, &stored.id, &stored.url).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(ApiResponse::created(user, "user registered successfully"))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<User>), ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("email and password are required".into()));
    }

    let user = User::find_by_email(&state.db, &email).await?.ok_or_else(|| {
        warn!(%email, "login unknown email");
        ApiError::Auth("invalid credentials".into())
    })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Auth("invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(user.id)?;
    let user = User::set_session_token(&state.db, user.id, &token).await?;

    let jar = jar.add(session_cookie(&token, state.config.jwt.session_ttl_days));
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((jar, ApiResponse::ok(user, "user login successful")))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<Option<()>>) {
    let jar = jar.add(expired_session_cookie());
    (jar, ApiResponse::ok(None, "user logout successful"))
}

#[instrument(skip(state, payload))]
pub async fn forget_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgetPasswordRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::Validation("email is required".into()));
    }
    if payload.answer.is_empty() {
        return Err(ApiError::Validation("answer is required".into()));
    }
    if payload.new_password.is_empty() {
        return Err(ApiError::Validation("new password is required".into()));
    }

    let email = payload.email.trim().to_lowercase();
    let user = User::find_by_email_and_answer(&state.db, &email, &payload.answer)
        .await?
        .ok_or_else(|| {
            warn!(%email, "password reset with wrong email/answer pair");
            ApiError::NotFound("please enter correct email and answer".into())
        })?;

    let hash = hash_password(&payload.new_password)?;
    let user = User::set_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset");
    Ok(ApiResponse::ok(user, "password reset successful"))
}

#[instrument(skip(state, mp))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<ApiResponse<User>, ApiError> {
    let form = UpdateUserForm::from_multipart(mp).await?;

    let current = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let uploaded = match &form.avatar {
        Some(file) => Some(
            media::upload_avatar(&state, id, file)
                .await
                .map_err(|e| ApiError::Upstream(format!("avatar upload failed: {e}")))?,
        ),
        None => None,
    };

    let user = User::update_profile(
        &state.db,
        id,
        form.first_name.as_deref(),
        form.last_name.as_deref(),
        form.phone.as_deref(),
        uploaded.as_ref().map(|m| (m.id.as_str(), m.url.as_str())),
    )
    .await?;

    if uploaded.is_some() {
        media::remove_avatar(&state, &current.avatar_id).await;
    }

    info!(user_id = %user.id, updated_by = %claims.sub, "user updated");
    Ok(ApiResponse::ok(user, "user updated successfully"))
}

#[instrument(skip(state))]
pub async fn get_user_profile(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(ApiResponse::ok(user, "user fetched successfully"))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    let users = User::list(&state.db).await?;
    info!(admin_id = %admin.id, count = users.len(), "users listed");
    Ok(ApiResponse::ok(users, "users fetched successfully"))
}

#[cfg(test)]
mod cookie_tests {
    use super::*;

    #[test]
    fn session_cookie_is_hardened() {
        let cookie = session_cookie("abc.def.ghi", 7);
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc.def.ghi");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }

    #[test]
    fn logout_cookie_expires_immediately() {
        let cookie = expired_session_cookie();
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.http_only(), Some(true));
    }
}
