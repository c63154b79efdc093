use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Months;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    domain::availability::{occupancy_rate, occupied_days, BookingInterval},
    error::{AppError, AppResult},
    repository::{bookings::list_intervals, properties},
    schemas::{parse_date, parse_month, CalendarQuery, OccupancyQuery},
    state::AppState,
};

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/reports/occupancy", axum::routing::get(occupancy_report))
        .route("/reports/calendar", axum::routing::get(month_calendar))
}

/// Occupancy over a half-open period `[from_date, to_date)`: distinct
/// occupied days per property and the rate over all available day slots.
/// Pending, confirmed, and blocked bookings occupy days; cancelled ones do
/// not. An inverted period reports zero occupancy rather than failing.
async fn occupancy_report(
    State(state): State<AppState>,
    Query(query): Query<OccupancyQuery>,
) -> AppResult<Json<Value>> {
    let period_start = parse_date(&query.from_date, "from_date")?;
    let period_end = parse_date(&query.to_date, "to_date")?;

    let cache_key = format!(
        "occupancy:{period_start}:{period_end}:{}",
        query
            .property_id
            .map(|id| id.to_string())
            .unwrap_or_default()
    );
    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let pool = db_pool(&state)?;
    let property_count = match query.property_id {
        Some(property_id) => {
            properties::get_property(pool, property_id).await?;
            1
        }
        None => properties::count_properties(pool).await?,
    };

    let intervals = list_intervals(pool, query.property_id).await?;
    let mut by_property: BTreeMap<Uuid, Vec<BookingInterval>> = BTreeMap::new();
    for interval in intervals {
        by_property
            .entry(interval.property_id)
            .or_default()
            .push(interval);
    }

    let days_in_period = (period_end - period_start).num_days().max(0) as u64;
    let mut occupied_total = 0_u64;
    let mut per_property = Vec::with_capacity(by_property.len());
    for (property_id, property_intervals) in &by_property {
        let days = occupied_days(period_start, period_end, property_intervals);
        occupied_total += days.len() as u64;
        per_property.push(json!({
            "property_id": property_id,
            "occupied_days": days.len(),
            "occupancy_rate": occupancy_rate(days.len() as u64, days_in_period, 1),
        }));
    }

    let payload = json!({
        "from_date": period_start,
        "to_date": period_end,
        "days_in_period": days_in_period,
        "property_count": property_count,
        "occupied_days": occupied_total,
        "occupancy_rate": occupancy_rate(occupied_total, days_in_period, property_count.max(0) as u64),
        "properties": per_property,
    });

    state.report_cache.insert(cache_key, payload.clone()).await;
    Ok(Json(payload))
}

/// Occupied days of one property for a calendar month, blocked ranges
/// included, for the month-view calendar.
async fn month_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Value>> {
    let month_start = parse_month(&query.month)?;
    let month_end = month_start + Months::new(1);

    let cache_key = format!("calendar:{}:{month_start}", query.property_id);
    if let Some(cached) = state.report_cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let pool = db_pool(&state)?;
    properties::get_property(pool, query.property_id).await?;

    let intervals = list_intervals(pool, Some(query.property_id)).await?;
    let days = occupied_days(month_start, month_end, &intervals);

    let payload = json!({
        "property_id": query.property_id,
        "month": query.month.trim(),
        "days_in_month": (month_end - month_start).num_days(),
        "occupied_day_count": days.len(),
        "occupied_days": days.iter().map(ToString::to_string).collect::<Vec<_>>(),
    });

    state.report_cache.insert(cache_key, payload.clone()).await;
    Ok(Json(payload))
}

fn db_pool(state: &AppState) -> AppResult<&sqlx::PgPool> {
    state.db_pool.as_ref().ok_or_else(|| {
        AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
    })
}
