use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::db::{UserAccount, UserResponse};
use crate::portal::SignupForm;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
    pub user: UserResponse,
}

/// Logged-in caller of a protected API route
pub struct AuthUser {
    pub user: UserAccount,
    pub token: String,
}

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        let user = state.portal.authenticate(&token).await?;
        Ok(AuthUser { user, token })
    }
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignupForm>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.portal.signup(&form).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = state.portal.login(&request.email, &request.password).await?;
    Ok(Json(LoginResponse {
        message: outcome.welcome_message(),
        token: outcome.token,
        user: outcome.user.into(),
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<StatusCode, ApiError> {
    state.portal.logout(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/me
pub async fn me(auth: AuthUser) -> Json<UserResponse> {
    Json(auth.user.into())
}
