//! Reference data: supported currencies and plans

use axum::{extract::State, Json};

use core_kernel::CurrencyDefinition;
use domain_membership::TierDefinition;

use crate::AppState;

pub async fn list_currencies(State(state): State<AppState>) -> Json<Vec<CurrencyDefinition>> {
    Json(state.invoicing.context().currencies.iter().cloned().collect())
}

/// Plans in ascending price order
pub async fn list_tiers(State(state): State<AppState>) -> Json<Vec<TierDefinition>> {
    Json(state.invoicing.context().tiers.iter().cloned().collect())
}
