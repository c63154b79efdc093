use chrono_tz::Tz;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::domain::pricing::PricingConfig;
use crate::error::{AppError, AppResult};
use crate::repository::map_db_error;

/// The organization's pricing settings. One row per deployment; seasonal
/// bases are quoted for the fixed 21-night reference period.
#[derive(Debug, Clone, FromRow)]
pub struct PricingSettingsRow {
    pub low_season_nightly_basis: Decimal,
    pub high_season_nightly_basis: Decimal,
    pub low_season_months: Vec<i32>,
    pub linens_fee: Decimal,
    pub mid_stay_cleaning_fee: Decimal,
    pub cancellation_insurance_rate_percent: Decimal,
    pub tourist_tax_per_person_per_night: Decimal,
    pub invoice_prefix: String,
    pub timezone: String,
}

impl PricingSettingsRow {
    pub fn pricing_config(&self) -> PricingConfig {
        PricingConfig {
            low_season_nightly_basis: self.low_season_nightly_basis,
            high_season_nightly_basis: self.high_season_nightly_basis,
            low_season_months: self
                .low_season_months
                .iter()
                .filter(|month| (1..=12).contains(*month))
                .map(|month| *month as u32)
                .collect(),
            linens_fee: self.linens_fee,
            mid_stay_cleaning_fee: self.mid_stay_cleaning_fee,
            cancellation_insurance_rate_percent: self.cancellation_insurance_rate_percent,
            tourist_tax_per_person_per_night: self.tourist_tax_per_person_per_night,
        }
    }

    /// Business timezone for invoice-day boundaries, falling back to the
    /// given default when the stored name does not parse.
    pub fn business_timezone(&self, fallback: &str) -> Tz {
        self.timezone
            .parse::<Tz>()
            .ok()
            .or_else(|| fallback.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC)
    }
}

pub async fn load_pricing_settings(pool: &PgPool) -> AppResult<PricingSettingsRow> {
    sqlx::query_as::<_, PricingSettingsRow>(
        "SELECT low_season_nightly_basis, high_season_nightly_basis, low_season_months, \
         linens_fee, mid_stay_cleaning_fee, cancellation_insurance_rate_percent, \
         tourist_tax_per_person_per_night, invoice_prefix, timezone \
         FROM pricing_settings LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .map_err(map_db_error)?
    .ok_or_else(|| AppError::Dependency("Pricing settings are not configured.".to_string()))
}
