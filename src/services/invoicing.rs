use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::availability::BookingStatus;
use crate::error::{AppError, AppResult};
use crate::repository::bookings::get_booking;
use crate::repository::invoices::{self, InvoiceRow};
use crate::repository::settings;

/// Create an invoice for a booking, minting the next number for today's
/// `(day, prefix)` scope inside the repository's serializable transaction.
/// Once minted the number is immutable; deleting the invoice later leaves a
/// gap in the sequence.
pub async fn create_invoice(
    pool: &PgPool,
    config: &AppConfig,
    booking_id: Uuid,
) -> AppResult<InvoiceRow> {
    let booking = get_booking(pool, booking_id).await?;
    match BookingStatus::parse(&booking.status) {
        Some(BookingStatus::Pending | BookingStatus::Confirmed) => {}
        _ => {
            return Err(AppError::BadRequest(
                "Only pending or confirmed bookings can be invoiced.".to_string(),
            ))
        }
    }

    let pricing_settings = settings::load_pricing_settings(pool).await?;
    let tz = pricing_settings.business_timezone(&config.default_business_timezone);

    let invoice = invoices::create_for_booking(
        pool,
        booking.id,
        booking.total_price,
        &pricing_settings.invoice_prefix,
        tz,
        config.invoice_numbering_max_attempts,
    )
    .await?;

    tracing::info!(
        invoice_id = %invoice.id,
        number = %invoice.number,
        booking_id = %booking.id,
        amount = %invoice.amount,
        "Invoice created"
    );
    Ok(invoice)
}
