//! Invoice handlers
//!
//! Every route is scoped to the authenticated user; another account's
//! invoice id behaves exactly like an unknown one.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;

use core_kernel::InvoiceId;
use domain_invoicing::{Invoice, InvoiceDraftInput, InvoiceStatus, InvoiceView};

use crate::dto::invoice::{
    line_item_inputs, numeric_text, CreateInvoiceRequest, InvoiceSummary, ListQuery,
    NextNumberResponse, StatusRequest, TaxRateRequest, UpdateItemsRequest, ViewQuery,
};
use crate::middleware::CurrentUser;
use crate::pdf::render_invoice;
use crate::{error::ApiError, AppState};

/// Creates an invoice, subject to the plan's monthly quota
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let input: InvoiceDraftInput = request.into();
    let invoice = state.invoicing.create_invoice(owner, &input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Lists invoices newest first; `?overdue=true` keeps only overdue ones
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InvoiceSummary>>, ApiError> {
    let today = Utc::now().date_naive();
    let invoices = if query.overdue {
        state.invoicing.overdue_invoices(owner, today).await?
    } else {
        state.invoicing.list_invoices(owner).await?
    };

    let formatter = state.invoicing.formatter();
    Ok(Json(
        invoices
            .iter()
            .map(|invoice| InvoiceSummary::build(invoice, formatter, today))
            .collect(),
    ))
}

pub async fn next_number(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
) -> Result<Json<NextNumberResponse>, ApiError> {
    let invoice_number = state.invoicing.next_invoice_number(owner).await?;
    Ok(Json(NextNumberResponse { invoice_number }))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let id = parse_invoice_id(&id)?;
    Ok(Json(state.invoicing.get_invoice(owner, id).await?))
}

/// Replaces line items (and optionally the tax rate)
pub async fn update_items(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateItemsRequest>,
) -> Result<Json<Invoice>, ApiError> {
    let id = parse_invoice_id(&id)?;
    let rows = line_item_inputs(&request.items);
    let tax_rate = request.tax_rate_text();
    let invoice = state
        .invoicing
        .update_items(owner, id, &rows, tax_rate.as_deref(), Utc::now())
        .await?;
    Ok(Json(invoice))
}

pub async fn update_tax_rate(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<TaxRateRequest>,
) -> Result<Json<Invoice>, ApiError> {
    let id = parse_invoice_id(&id)?;
    let invoice = state
        .invoicing
        .update_tax_rate(owner, id, &numeric_text(&request.tax_rate), Utc::now())
        .await?;
    Ok(Json(invoice))
}

/// Moves the invoice to `sent` or `paid`
pub async fn update_status(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Invoice>, ApiError> {
    let id = parse_invoice_id(&id)?;
    let status: InvoiceStatus = request
        .status
        .parse()
        .map_err(|e: domain_invoicing::ValidationError| ApiError::validation(e.to_string()))?;
    let invoice = state
        .invoicing
        .change_status(owner, id, status, Utc::now())
        .await?;
    Ok(Json(invoice))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_invoice_id(&id)?;
    state.invoicing.delete_invoice(owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Formatted view, optionally with the total converted to `?convert_to=`
pub async fn view_invoice(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<InvoiceView>, ApiError> {
    let id = parse_invoice_id(&id)?;
    let view = state
        .invoicing
        .view_invoice(owner, id, query.convert_to.as_deref(), Utc::now())
        .await?;
    Ok(Json(view))
}

/// Downloads the invoice as a PDF attachment when the plan includes export
pub async fn export_pdf(
    State(state): State<AppState>,
    Extension(CurrentUser(owner)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_invoice_id(&id)?;
    let export = state.invoicing.export_invoice(owner, id, Utc::now()).await?;
    let bytes = render_invoice(&export)?;
    let disposition = format!("attachment; filename=\"{}\"", export.file_name("pdf"));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

fn parse_invoice_id(raw: &str) -> Result<InvoiceId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("Invoice not found: {}", raw)))
}
