use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::invoice_number;
use crate::error::{AppError, AppResult};
use crate::repository::map_db_error;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub prefix: String,
    pub number: String,
    pub issued_on: NaiveDate,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Create an invoice with a freshly minted number.
///
/// The count of invoices created today and the insert run inside one
/// serializable transaction, so two concurrent creations cannot both read
/// the same count; the loser aborts with a serialization failure (or trips
/// the unique index on the number) and the whole count-and-insert is
/// retried here, up to `max_attempts` times. "Today" is the calendar day in
/// the business timezone, by creation timestamp.
pub async fn create_for_booking(
    pool: &PgPool,
    booking_id: Uuid,
    amount: Decimal,
    prefix: &str,
    tz: Tz,
    max_attempts: u32,
) -> AppResult<InvoiceRow> {
    let day = Utc::now().with_timezone(&tz).date_naive();
    let day_start = local_day_start_utc(day, tz);
    let day_end = local_day_start_utc(day + chrono::Duration::days(1), tz);

    let mut attempt = 0;
    loop {
        attempt += 1;
        match try_create(pool, booking_id, amount, prefix, day, day_start, day_end).await {
            Ok(invoice) => return Ok(invoice),
            Err(error) if is_numbering_race(&error) => {
                if attempt >= max_attempts.max(1) {
                    tracing::warn!(
                        booking_id = %booking_id,
                        attempts = attempt,
                        "Invoice numbering kept racing, giving up"
                    );
                    return Err(AppError::ServiceUnavailable(
                        "Invoice numbering is contended, please retry.".to_string(),
                    ));
                }
                tracing::warn!(booking_id = %booking_id, attempt, "Invoice numbering raced, retrying");
            }
            Err(error) => return Err(map_db_error(error)),
        }
    }
}

async fn try_create(
    pool: &PgPool,
    booking_id: Uuid,
    amount: Decimal,
    prefix: &str,
    day: NaiveDate,
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
) -> Result<InvoiceRow, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;

    // Invoices created today for this prefix, by creation timestamp. Counting
    // creations rather than surviving rows means deletions leave gaps in the
    // sequence; that is intended.
    let created_today: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM invoices WHERE prefix = $1 \
         AND created_at >= $2 AND created_at < $3",
    )
    .bind(prefix)
    .bind(day_start)
    .bind(day_end)
    .fetch_one(&mut *tx)
    .await?;

    let number = invoice_number::next(day, prefix, || created_today);

    let invoice = sqlx::query_as::<_, InvoiceRow>(
        "INSERT INTO invoices (booking_id, prefix, number, issued_on, amount) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, booking_id, prefix, number, issued_on, amount, created_at",
    )
    .bind(booking_id)
    .bind(prefix)
    .bind(&number)
    .bind(day)
    .bind(amount)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(invoice)
}

/// Serialization failure (40001) from the isolation level, or a unique
/// violation (23505) from the backstop index on the invoice number.
fn is_numbering_race(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("40001") | Some("23505"))
        }
        _ => false,
    }
}

/// UTC instant at which `day` starts in the given timezone. On DST gaps the
/// earliest valid local time is used.
fn local_day_start_utc(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}

pub async fn list_invoices(
    pool: &PgPool,
    booking_id: Option<Uuid>,
    limit: i64,
) -> AppResult<Vec<InvoiceRow>> {
    sqlx::query_as::<_, InvoiceRow>(
        "SELECT id, booking_id, prefix, number, issued_on, amount, created_at \
         FROM invoices \
         WHERE ($1::uuid IS NULL OR booking_id = $1) \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(booking_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(map_db_error)
}
