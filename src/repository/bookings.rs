use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::availability::{BookingInterval, BookingStatus};
use crate::domain::pricing::PriceBreakdown;
use crate::error::{AppError, AppResult};
use crate::repository::map_db_error;

const BOOKING_COLUMNS: &str = "id, property_id, client_id, start_date, end_date, status, \
     adults, children, linens, mid_stay_cleaning, cancellation_insurance, \
     discount_kind, discount_amount, nights, base_price, discount, linens_fee, \
     mid_stay_cleaning_fee, cancellation_insurance_fee, tourist_tax, total_price, \
     notes, created_at, updated_at";

/// A booking row with its persisted price breakdown.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookingRow {
    pub id: Uuid,
    pub property_id: Uuid,
    pub client_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub adults: i32,
    pub children: i32,
    pub linens: bool,
    pub mid_stay_cleaning: bool,
    pub cancellation_insurance: bool,
    pub discount_kind: String,
    pub discount_amount: Decimal,
    pub nights: i32,
    pub base_price: Decimal,
    pub discount: Decimal,
    pub linens_fee: Decimal,
    pub mid_stay_cleaning_fee: Decimal,
    pub cancellation_insurance_fee: Decimal,
    pub tourist_tax: Decimal,
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Stay fields and computed pricing for an insert or full stay update.
#[derive(Debug, Clone)]
pub struct BookingWrite {
    pub property_id: Uuid,
    pub client_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub adults: i32,
    pub children: i32,
    pub linens: bool,
    pub mid_stay_cleaning: bool,
    pub cancellation_insurance: bool,
    pub discount_kind: String,
    pub discount_amount: Decimal,
    pub notes: Option<String>,
    pub breakdown: PriceBreakdown,
}

pub async fn insert_booking(pool: &PgPool, booking: &BookingWrite) -> AppResult<BookingRow> {
    let sql = format!(
        "INSERT INTO bookings (property_id, client_id, start_date, end_date, status, \
         adults, children, linens, mid_stay_cleaning, cancellation_insurance, \
         discount_kind, discount_amount, nights, base_price, discount, linens_fee, \
         mid_stay_cleaning_fee, cancellation_insurance_fee, tourist_tax, total_price, notes) \
         VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
         $15, $16, $17, $18, $19, $20) \
         RETURNING {BOOKING_COLUMNS}"
    );
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(booking.property_id)
        .bind(booking.client_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(booking.linens)
        .bind(booking.mid_stay_cleaning)
        .bind(booking.cancellation_insurance)
        .bind(&booking.discount_kind)
        .bind(booking.discount_amount)
        .bind(booking.breakdown.nights as i32)
        .bind(booking.breakdown.base_price)
        .bind(booking.breakdown.discount)
        .bind(booking.breakdown.linens_fee)
        .bind(booking.breakdown.mid_stay_cleaning_fee)
        .bind(booking.breakdown.cancellation_insurance_fee)
        .bind(booking.breakdown.tourist_tax)
        .bind(booking.breakdown.total_price)
        .bind(booking.notes.as_deref())
        .fetch_one(pool)
        .await
        .map_err(map_db_error)
}

pub async fn update_booking_stay(
    pool: &PgPool,
    booking_id: Uuid,
    booking: &BookingWrite,
) -> AppResult<BookingRow> {
    let sql = format!(
        "UPDATE bookings SET property_id = $1, client_id = $2, start_date = $3, \
         end_date = $4, adults = $5, children = $6, linens = $7, mid_stay_cleaning = $8, \
         cancellation_insurance = $9, discount_kind = $10, discount_amount = $11, \
         nights = $12, base_price = $13, discount = $14, linens_fee = $15, \
         mid_stay_cleaning_fee = $16, cancellation_insurance_fee = $17, tourist_tax = $18, \
         total_price = $19, notes = $20, updated_at = now() \
         WHERE id = $21 \
         RETURNING {BOOKING_COLUMNS}"
    );
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(booking.property_id)
        .bind(booking.client_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(booking.linens)
        .bind(booking.mid_stay_cleaning)
        .bind(booking.cancellation_insurance)
        .bind(&booking.discount_kind)
        .bind(booking.discount_amount)
        .bind(booking.breakdown.nights as i32)
        .bind(booking.breakdown.base_price)
        .bind(booking.breakdown.discount)
        .bind(booking.breakdown.linens_fee)
        .bind(booking.breakdown.mid_stay_cleaning_fee)
        .bind(booking.breakdown.cancellation_insurance_fee)
        .bind(booking.breakdown.tourist_tax)
        .bind(booking.breakdown.total_price)
        .bind(booking.notes.as_deref())
        .bind(booking_id)
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::NotFound("Booking not found.".to_string()))
}

pub async fn update_booking_status(
    pool: &PgPool,
    booking_id: Uuid,
    status: BookingStatus,
) -> AppResult<BookingRow> {
    let sql = format!(
        "UPDATE bookings SET status = $2, updated_at = now() WHERE id = $1 \
         RETURNING {BOOKING_COLUMNS}"
    );
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(booking_id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::NotFound("Booking not found.".to_string()))
}

pub async fn get_booking(pool: &PgPool, booking_id: Uuid) -> AppResult<BookingRow> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(booking_id)
        .fetch_optional(pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::NotFound("Booking not found.".to_string()))
}

pub async fn list_bookings(
    pool: &PgPool,
    property_id: Option<Uuid>,
    status: Option<&str>,
    limit: i64,
) -> AppResult<Vec<BookingRow>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings \
         WHERE ($1::uuid IS NULL OR property_id = $1) \
         AND ($2::text IS NULL OR status = $2) \
         ORDER BY start_date DESC \
         LIMIT $3"
    );
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(property_id)
        .bind(status)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(map_db_error)
}

/// Load booking date ranges for the availability engine. Rows with a status
/// the engine does not know are skipped rather than failing the whole load.
pub async fn list_intervals(
    pool: &PgPool,
    property_id: Option<Uuid>,
) -> AppResult<Vec<BookingInterval>> {
    #[derive(FromRow)]
    struct IntervalRow {
        id: Uuid,
        property_id: Uuid,
        client_id: Option<Uuid>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: String,
    }

    let rows = sqlx::query_as::<_, IntervalRow>(
        "SELECT id, property_id, client_id, start_date, end_date, status FROM bookings \
         WHERE ($1::uuid IS NULL OR property_id = $1)",
    )
    .bind(property_id)
    .fetch_all(pool)
    .await
    .map_err(map_db_error)?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            Some(BookingInterval {
                id: row.id,
                property_id: row.property_id,
                client_id: row.client_id,
                start_date: row.start_date,
                end_date: row.end_date,
                status: BookingStatus::parse(&row.status)?,
            })
        })
        .collect())
}
