use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    repository::invoices::list_invoices,
    schemas::{clamp_limit_in_range, CreateInvoiceInput, InvoicesQuery},
    services,
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/invoices",
        axum::routing::get(list_invoices_route).post(create_invoice),
    )
}

async fn list_invoices_route(
    State(state): State<AppState>,
    Query(query): Query<InvoicesQuery>,
) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;
    let limit = clamp_limit_in_range(query.limit.unwrap_or(100), 1, 1000);
    let rows = list_invoices(pool, query.booking_id, limit).await?;
    Ok(Json(json!({ "data": rows })))
}

async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceInput>,
) -> AppResult<impl IntoResponse> {
    let pool = db_pool(&state)?;
    let invoice =
        services::invoicing::create_invoice(pool, &state.config, payload.booking_id).await?;
    Ok((axum::http::StatusCode::CREATED, Json(invoice)))
}

fn db_pool(state: &AppState) -> AppResult<&sqlx::PgPool> {
    state.db_pool.as_ref().ok_or_else(|| {
        AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
    })
}
