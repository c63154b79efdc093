use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::UnprocessableEntity(format!("Validation failed: {errors}")))
}

pub fn clamp_limit_in_range(limit: i64, min: i64, max: i64) -> i64 {
    limit.clamp(min, max)
}

/// Parse an ISO `YYYY-MM-DD` date from user input.
pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid {field}: expected YYYY-MM-DD.")))
}

/// Parse a `YYYY-MM` month into its first day.
pub fn parse_month(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid month: expected YYYY-MM.".to_string()))
}

fn default_one_adult() -> i32 {
    1
}
fn default_false() -> bool {
    false
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingInput {
    pub property_id: Uuid,
    pub client_id: Option<Uuid>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default = "default_one_adult")]
    #[validate(range(min = 1, message = "at least one adult is required"))]
    pub adults: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub children: i32,
    #[serde(default = "default_false")]
    pub linens: bool,
    #[serde(default = "default_false")]
    pub mid_stay_cleaning: bool,
    #[serde(default = "default_false")]
    pub cancellation_insurance: bool,
    pub discount_amount: Option<Decimal>,
    pub discount_kind: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingInput {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub linens: Option<bool>,
    pub mid_stay_cleaning: Option<bool>,
    pub cancellation_insurance: Option<bool>,
    pub discount_amount: Option<Decimal>,
    pub discount_kind: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingStatusInput {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingsQuery {
    pub property_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingPath {
    pub booking_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConflictsQuery {
    pub property_id: Uuid,
    pub start: String,
    pub end: String,
    pub client_id: Option<Uuid>,
    pub exclude_booking_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuoteInput {
    pub start_date: String,
    pub end_date: String,
    #[serde(default = "default_one_adult")]
    #[validate(range(min = 1, message = "at least one adult is required"))]
    pub adults: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub children: i32,
    #[serde(default = "default_false")]
    pub linens: bool,
    #[serde(default = "default_false")]
    pub mid_stay_cleaning: bool,
    #[serde(default = "default_false")]
    pub cancellation_insurance: bool,
    pub discount_amount: Option<Decimal>,
    pub discount_kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceInput {
    pub booking_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoicesQuery {
    pub booking_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OccupancyQuery {
    pub from_date: String,
    pub to_date: String,
    pub property_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub property_id: Uuid,
    pub month: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates_and_months() {
        assert!(parse_date("2025-06-10", "start date").is_ok());
        assert!(parse_date("10/06/2025", "start date").is_err());
        assert_eq!(
            parse_month("2025-06").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert!(parse_month("June 2025").is_err());
    }

    #[test]
    fn clamps_limits() {
        assert_eq!(clamp_limit_in_range(0, 1, 100), 1);
        assert_eq!(clamp_limit_in_range(5000, 1, 100), 100);
        assert_eq!(clamp_limit_in_range(50, 1, 100), 50);
    }
}
