//! Registration and login handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use validator::Validate;

use domain_membership::User;

use crate::auth::create_token;
use crate::dto::auth::{LoginRequest, RegisterRequest, TokenResponse};
use crate::{error::ApiError, AppState};

/// Registers a free-tier account and logs it in
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    request.validate()?;
    let user = state.membership.register(request.into(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(issue_token(&state, user)?)))
}

/// Exchanges email and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    request.validate()?;
    let user = state
        .membership
        .authenticate(&request.email, &request.password)
        .await?;
    Ok(Json(issue_token(&state, user)?))
}

fn issue_token(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let expires_in = state.config.jwt_expiration_secs;
    let access_token = create_token(user.id, &user.email, &state.config.jwt_secret, expires_in)?;
    Ok(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in,
        user,
    })
}
