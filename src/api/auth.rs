//! Bearer authentication and the `/api/auth` routes

use axum::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::SecureString;
use crate::error::FintrackError;
use crate::models::{User, UserProfile};
use crate::services::{AuthService, RegisterInput};

use super::response::{created, ok, ApiError, ApiResponse, ApiResult};
use super::AppState;

/// The authenticated caller, resolved from `Authorization: Bearer <token>`
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| FintrackError::Unauthorized("Missing bearer token".into()))?;

        let lookup = token.clone();
        let user = state
            .run(move |storage, settings| AuthService::new(storage, settings).authenticate(&lookup))
            .await?;
        tracing::debug!(user = %user.id, "request authenticated");
        Ok(Self { user, token })
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub password: SecureString,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: SecureString,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    let user = state
        .run(move |storage, settings| {
            AuthService::new(storage, settings).register(RegisterInput {
                username: req.username,
                email: req.email,
                display_name: req.display_name,
                password: req.password,
            })
        })
        .await?;
    created(user.profile())
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let outcome = state
        .run(move |storage, settings| {
            AuthService::new(storage, settings).login(&req.identifier, req.password.as_str())
        })
        .await?;
    ok(LoginResponse {
        token: outcome.token.as_str().to_string(),
        expires_at: outcome.session.expires_at,
        user: outcome.user.profile(),
    })
}

pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<bool> {
    let token = auth.token;
    let ended = state
        .run(move |storage, settings| AuthService::new(storage, settings).logout(&token))
        .await?;
    ok(ended)
}

pub async fn me(auth: AuthUser) -> ApiResult<UserProfile> {
    ok(auth.user.profile())
}
