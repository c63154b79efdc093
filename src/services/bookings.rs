use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::availability::{self, BookingStatus, Conflict, ProposedStay};
use crate::domain::pricing::{self, DiscountKind, PriceBreakdown, StayRequest};
use crate::error::{AppError, AppResult};
use crate::repository::bookings::{
    get_booking, insert_booking, list_intervals, update_booking_status, update_booking_stay,
    BookingRow, BookingWrite,
};
use crate::repository::{properties, settings};
use crate::schemas::{
    parse_date, validate_input, CreateBookingInput, QuoteInput, UpdateBookingInput,
};

/// Create a booking: validate the stay, reject conflicting dates, price it,
/// and persist the full breakdown.
pub async fn create_booking(pool: &PgPool, input: CreateBookingInput) -> AppResult<BookingRow> {
    validate_input(&input)?;
    let (start_date, end_date) = parse_stay_dates(&input.start_date, &input.end_date)?;
    let discount_amount = non_negative_discount(input.discount_amount)?;
    let discount_kind = DiscountKind::parse(input.discount_kind.as_deref());

    properties::get_property(pool, input.property_id).await?;

    let existing = list_intervals(pool, Some(input.property_id)).await?;
    let proposed = ProposedStay {
        property_id: input.property_id,
        start_date,
        end_date,
        client_id: input.client_id,
        exclude_booking_id: None,
    };
    let conflicts = availability::find_conflicts(&proposed, &existing);
    if !conflicts.is_empty() {
        return Err(AppError::Conflict(conflict_detail(&conflicts)));
    }

    let pricing_settings = settings::load_pricing_settings(pool).await?;
    let stay = StayRequest {
        start_date,
        end_date,
        adults: input.adults,
        children: input.children,
        linens: input.linens,
        mid_stay_cleaning: input.mid_stay_cleaning,
        cancellation_insurance: input.cancellation_insurance,
        discount_amount,
        discount_kind,
    };
    let breakdown = pricing::calculate(&stay, &pricing_settings.pricing_config());

    let booking = insert_booking(
        pool,
        &BookingWrite {
            property_id: input.property_id,
            client_id: input.client_id,
            start_date,
            end_date,
            adults: input.adults,
            children: input.children,
            linens: input.linens,
            mid_stay_cleaning: input.mid_stay_cleaning,
            cancellation_insurance: input.cancellation_insurance,
            discount_kind: discount_kind.as_str().to_string(),
            discount_amount,
            notes: input.notes,
            breakdown: breakdown.clone(),
        },
    )
    .await?;

    tracing::info!(
        booking_id = %booking.id,
        property_id = %booking.property_id,
        nights = breakdown.nights,
        total_price = %breakdown.total_price,
        "Booking created"
    );
    Ok(booking)
}

/// Edit a booking's stay. The availability check excludes the booking
/// itself, and the price is recomputed from the merged stay.
pub async fn update_booking(
    pool: &PgPool,
    booking_id: Uuid,
    input: UpdateBookingInput,
) -> AppResult<BookingRow> {
    let current = get_booking(pool, booking_id).await?;

    let start_date = match &input.start_date {
        Some(raw) => parse_date(raw, "start date")?,
        None => current.start_date,
    };
    let end_date = match &input.end_date {
        Some(raw) => parse_date(raw, "end date")?,
        None => current.end_date,
    };
    if end_date <= start_date {
        return Err(AppError::BadRequest(
            "End date must be after start date.".to_string(),
        ));
    }

    let adults = input.adults.unwrap_or(current.adults);
    if adults < 1 {
        return Err(AppError::UnprocessableEntity(
            "At least one adult is required.".to_string(),
        ));
    }
    let children = input.children.unwrap_or(current.children);
    if children < 0 {
        return Err(AppError::UnprocessableEntity(
            "Child count cannot be negative.".to_string(),
        ));
    }

    let discount_amount = non_negative_discount(
        input.discount_amount.or(Some(current.discount_amount)),
    )?;
    let discount_kind = match input.discount_kind.as_deref() {
        Some(raw) => DiscountKind::parse(Some(raw)),
        None => DiscountKind::parse(Some(current.discount_kind.as_str())),
    };

    let existing = list_intervals(pool, Some(current.property_id)).await?;
    let proposed = ProposedStay {
        property_id: current.property_id,
        start_date,
        end_date,
        client_id: current.client_id,
        exclude_booking_id: Some(booking_id),
    };
    let conflicts = availability::find_conflicts(&proposed, &existing);
    if !conflicts.is_empty() {
        return Err(AppError::Conflict(conflict_detail(&conflicts)));
    }

    let pricing_settings = settings::load_pricing_settings(pool).await?;
    let stay = StayRequest {
        start_date,
        end_date,
        adults,
        children,
        linens: input.linens.unwrap_or(current.linens),
        mid_stay_cleaning: input.mid_stay_cleaning.unwrap_or(current.mid_stay_cleaning),
        cancellation_insurance: input
            .cancellation_insurance
            .unwrap_or(current.cancellation_insurance),
        discount_amount,
        discount_kind,
    };
    let breakdown = pricing::calculate(&stay, &pricing_settings.pricing_config());

    let booking = update_booking_stay(
        pool,
        booking_id,
        &BookingWrite {
            property_id: current.property_id,
            client_id: current.client_id,
            start_date,
            end_date,
            adults,
            children,
            linens: stay.linens,
            mid_stay_cleaning: stay.mid_stay_cleaning,
            cancellation_insurance: stay.cancellation_insurance,
            discount_kind: discount_kind.as_str().to_string(),
            discount_amount,
            notes: input.notes.or(current.notes),
            breakdown,
        },
    )
    .await?;

    tracing::info!(booking_id = %booking.id, "Booking updated");
    Ok(booking)
}

/// Transition a booking's status. Unknown statuses are rejected with the
/// allowed list.
pub async fn set_booking_status(
    pool: &PgPool,
    booking_id: Uuid,
    raw_status: &str,
) -> AppResult<BookingRow> {
    let Some(status) = BookingStatus::parse(raw_status) else {
        return Err(AppError::BadRequest(
            "status must be one of: pending, confirmed, cancelled, blocked".to_string(),
        ));
    };
    let booking = update_booking_status(pool, booking_id, status).await?;
    tracing::info!(booking_id = %booking.id, status = status.as_str(), "Booking status changed");
    Ok(booking)
}

/// Price a stay without persisting anything.
pub async fn quote(pool: &PgPool, input: QuoteInput) -> AppResult<PriceBreakdown> {
    validate_input(&input)?;
    let (start_date, end_date) = parse_stay_dates(&input.start_date, &input.end_date)?;
    let discount_amount = non_negative_discount(input.discount_amount)?;

    let pricing_settings = settings::load_pricing_settings(pool).await?;
    let stay = StayRequest {
        start_date,
        end_date,
        adults: input.adults,
        children: input.children,
        linens: input.linens,
        mid_stay_cleaning: input.mid_stay_cleaning,
        cancellation_insurance: input.cancellation_insurance,
        discount_amount,
        discount_kind: DiscountKind::parse(input.discount_kind.as_deref()),
    };
    Ok(pricing::calculate(&stay, &pricing_settings.pricing_config()))
}

/// Conflict preview for the booking form: every overlapping booking with
/// its classified case and whether it belongs to the same client.
pub async fn find_conflicts_for(
    pool: &PgPool,
    property_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    client_id: Option<Uuid>,
    exclude_booking_id: Option<Uuid>,
) -> AppResult<Vec<Conflict>> {
    if end_date <= start_date {
        return Err(AppError::BadRequest(
            "End date must be after start date.".to_string(),
        ));
    }
    let existing = list_intervals(pool, Some(property_id)).await?;
    let proposed = ProposedStay {
        property_id,
        start_date,
        end_date,
        client_id,
        exclude_booking_id,
    };
    Ok(availability::find_conflicts(&proposed, &existing))
}

fn parse_stay_dates(raw_start: &str, raw_end: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let start_date = parse_date(raw_start, "start date")?;
    let end_date = parse_date(raw_end, "end date")?;
    if end_date <= start_date {
        return Err(AppError::BadRequest(
            "End date must be after start date.".to_string(),
        ));
    }
    Ok((start_date, end_date))
}

fn non_negative_discount(amount: Option<Decimal>) -> AppResult<Decimal> {
    let amount = amount.unwrap_or(Decimal::ZERO);
    if amount < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Discount amount cannot be negative.".to_string(),
        ));
    }
    Ok(amount)
}

fn conflict_detail(conflicts: &[Conflict]) -> String {
    match conflicts {
        [] => "Selected dates overlap with an existing booking.".to_string(),
        [only] => format!(
            "Selected dates overlap with an existing booking: {} ({} to {}).",
            only.kind.message(),
            only.overlap_start,
            only.overlap_end
        ),
        [first, ..] => format!(
            "Selected dates overlap with {} existing bookings, first: {} ({} to {}).",
            conflicts.len(),
            first.kind.message(),
            first.overlap_start,
            first.overlap_end
        ),
    }
}
