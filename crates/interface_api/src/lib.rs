//! HTTP API Layer
//!
//! REST API for the invoicing system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: request handlers per resource
//! - **Middleware**: bearer authentication and audit logging
//! - **DTOs**: request/response bodies
//! - **Error Handling**: domain errors mapped to JSON error responses
//!
//! Handlers are thin: they parse the request, call `MembershipService` or
//! `InvoicingService`, and serialize the result.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, config::ApiConfig, AppState};
//!
//! let state = AppState::in_memory(ApiConfig::default())?;
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod pdf;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use core_kernel::{CoreError, CurrencyCode, CurrencyTable, ExchangeRateTable};
use domain_invoicing::ports::memory::InMemoryInvoiceStore;
use domain_invoicing::{InvoicePort, InvoicingContext, InvoicingService};
use domain_membership::ports::memory::InMemoryUserStore;
use domain_membership::{CredentialHasher, MembershipService, TierCatalog, UserPort};

use crate::auth::Argon2Hasher;
use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{account, auth as auth_handlers, health, invoices, reference};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub membership: MembershipService,
    pub invoicing: InvoicingService,
    pub users: Arc<dyn UserPort>,
    pub invoices: Arc<dyn InvoicePort>,
}

impl AppState {
    /// Wires services over the given storage adapters
    ///
    /// # Errors
    ///
    /// A configuration error if `config.default_currency` is not supported.
    pub fn new(
        config: ApiConfig,
        users: Arc<dyn UserPort>,
        invoices: Arc<dyn InvoicePort>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Result<Self, CoreError> {
        let context = reference_context(&config.default_currency)?;
        let membership = MembershipService::new(users.clone(), hasher, context.currencies.clone());
        let invoicing = InvoicingService::new(invoices.clone(), membership.clone(), context);

        Ok(Self {
            config,
            membership,
            invoicing,
            users,
            invoices,
        })
    }

    /// State backed by in-memory stores
    pub fn in_memory(config: ApiConfig) -> Result<Self, CoreError> {
        Self::new(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryInvoiceStore::new()),
            Arc::new(Argon2Hasher),
        )
    }
}

/// Standard reference tables with the configured fallback currency
fn reference_context(default_currency: &str) -> Result<InvoicingContext, CoreError> {
    let default_code: CurrencyCode = default_currency.parse()?;
    let currencies = Arc::new(CurrencyTable::new(
        CurrencyTable::standard().iter().cloned(),
        default_code,
    )?);
    let rates = Arc::new(ExchangeRateTable::standard(currencies.clone())?);
    Ok(InvoicingContext::new(currencies, rates, Arc::new(TierCatalog::standard())))
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login));

    let reference_routes = Router::new()
        .route("/currencies", get(reference::list_currencies))
        .route("/tiers", get(reference::list_tiers));

    let account_routes = Router::new()
        .route("/", get(account::get_account).delete(account::delete_account))
        .route("/usage", get(account::get_usage))
        .route("/upgrade", post(account::upgrade));

    let invoice_routes = Router::new()
        .route("/", get(invoices::list_invoices).post(invoices::create_invoice))
        .route("/next-number", get(invoices::next_number))
        .route(
            "/:id",
            get(invoices::get_invoice)
                .put(invoices::update_items)
                .delete(invoices::delete_invoice),
        )
        .route("/:id/status", put(invoices::update_status))
        .route("/:id/tax-rate", put(invoices::update_tax_rate))
        .route("/:id/view", get(invoices::view_invoice))
        .route("/:id/pdf", get(invoices::export_pdf));

    // Protected API routes
    let protected_routes = Router::new()
        .nest("/account", account_routes)
        .nest("/invoices", invoice_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .merge(reference_routes)
        .merge(protected_routes);

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
