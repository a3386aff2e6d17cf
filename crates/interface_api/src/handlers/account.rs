//! Account handlers

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};

use domain_membership::{Usage, User};

use crate::dto::account::{AccountDeletedResponse, AccountResponse, UpgradeRequest};
use crate::middleware::CurrentUser;
use crate::{error::ApiError, AppState};

pub async fn get_account(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
) -> Result<Json<AccountResponse>, ApiError> {
    let user = state.membership.get(owner).await?;
    Ok(Json(account_response(&state, user, Utc::now())))
}

/// This month's invoice count against the plan's quota
pub async fn get_usage(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
) -> Result<Json<Usage>, ApiError> {
    Ok(Json(state.invoicing.usage(owner, Utc::now()).await?))
}

/// Switches plan immediately; there is no payment step
pub async fn upgrade(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Json(request): Json<UpgradeRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let now = Utc::now();
    let user = state.invoicing.upgrade(owner, request.tier, now).await?;
    Ok(Json(account_response(&state, user, now)))
}

/// Deletes the account and every invoice it owns
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
) -> Result<Json<AccountDeletedResponse>, ApiError> {
    let invoices_removed = state.invoicing.delete_account(owner).await?;
    Ok(Json(AccountDeletedResponse { invoices_removed }))
}

fn account_response(state: &AppState, user: User, now: DateTime<Utc>) -> AccountResponse {
    let effective_tier = user.effective_tier(now);
    AccountResponse {
        features: state.invoicing.policy().catalog().features(effective_tier).clone(),
        effective_tier,
        user,
    }
}
