use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    repository::bookings::{get_booking, list_bookings},
    schemas::{
        clamp_limit_in_range, parse_date, BookingPath, BookingStatusInput, BookingsQuery,
        ConflictsQuery, CreateBookingInput, QuoteInput, UpdateBookingInput,
    },
    services,
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/bookings",
            axum::routing::get(list_bookings_route).post(create_booking),
        )
        .route("/bookings/quote", axum::routing::post(quote_booking))
        .route("/bookings/conflicts", axum::routing::get(preview_conflicts))
        .route(
            "/bookings/{booking_id}",
            axum::routing::get(get_booking_route).patch(update_booking),
        )
        .route(
            "/bookings/{booking_id}/status",
            axum::routing::patch(set_booking_status),
        )
}

async fn list_bookings_route(
    State(state): State<AppState>,
    Query(query): Query<BookingsQuery>,
) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;
    let limit = clamp_limit_in_range(query.limit.unwrap_or(100), 1, 1000);
    let rows = list_bookings(pool, query.property_id, query.status.as_deref(), limit).await?;
    Ok(Json(json!({ "data": rows })))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingInput>,
) -> AppResult<impl IntoResponse> {
    let pool = db_pool(&state)?;
    let booking = services::bookings::create_booking(pool, payload).await?;
    Ok((axum::http::StatusCode::CREATED, Json(booking)))
}

async fn get_booking_route(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
) -> AppResult<impl IntoResponse> {
    let pool = db_pool(&state)?;
    let booking = get_booking(pool, path.booking_id).await?;
    Ok(Json(booking))
}

async fn update_booking(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    Json(payload): Json<UpdateBookingInput>,
) -> AppResult<impl IntoResponse> {
    let pool = db_pool(&state)?;
    let booking = services::bookings::update_booking(pool, path.booking_id, payload).await?;
    Ok(Json(booking))
}

async fn set_booking_status(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    Json(payload): Json<BookingStatusInput>,
) -> AppResult<impl IntoResponse> {
    let pool = db_pool(&state)?;
    let booking =
        services::bookings::set_booking_status(pool, path.booking_id, &payload.status).await?;
    Ok(Json(booking))
}

async fn quote_booking(
    State(state): State<AppState>,
    Json(payload): Json<QuoteInput>,
) -> AppResult<impl IntoResponse> {
    let pool = db_pool(&state)?;
    let breakdown = services::bookings::quote(pool, payload).await?;
    Ok(Json(breakdown))
}

/// Conflict preview for the booking form. Each conflict carries the overlap
/// range, the classified case with its message, and whether the conflicting
/// booking belongs to the same client (the form may let a client extend
/// their own stay).
async fn preview_conflicts(
    State(state): State<AppState>,
    Query(query): Query<ConflictsQuery>,
) -> AppResult<Json<Value>> {
    let pool = db_pool(&state)?;
    let start_date = parse_date(&query.start, "start date")?;
    let end_date = parse_date(&query.end, "end date")?;

    let conflicts = services::bookings::find_conflicts_for(
        pool,
        query.property_id,
        start_date,
        end_date,
        query.client_id,
        query.exclude_booking_id,
    )
    .await?;

    let data: Vec<Value> = conflicts
        .iter()
        .map(|conflict| {
            json!({
                "booking_id": conflict.booking_id,
                "overlap_start": conflict.overlap_start,
                "overlap_end": conflict.overlap_end,
                "kind": conflict.kind,
                "message": conflict.kind.message(),
                "is_same_client": conflict.is_same_client,
            })
        })
        .collect();

    Ok(Json(json!({
        "has_conflict": !data.is_empty(),
        "conflicts": data,
    })))
}

fn db_pool(state: &AppState) -> AppResult<&sqlx::PgPool> {
    state.db_pool.as_ref().ok_or_else(|| {
        AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
    })
}
