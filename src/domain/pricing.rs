use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Seasonal basis prices are quoted for a fixed 21-night reference period;
/// the nightly rate is always basis / 21.
const BASIS_NIGHTS: i64 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percent,
    Amount,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl DiscountKind {
    /// Parse a stored discount kind. Anything unrecognized (including an
    /// absent value) falls back to `Unspecified`, which prices like a flat
    /// amount.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("percent") => Self::Percent,
            Some("amount") => Self::Amount,
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Amount => "amount",
            Self::Unspecified => "unspecified",
        }
    }
}

/// A proposed stay, already shape-validated by the caller: `end_date` is
/// strictly after `start_date`, counts are non-negative, `adults >= 1`.
#[derive(Debug, Clone)]
pub struct StayRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub adults: i32,
    pub children: i32,
    pub linens: bool,
    pub mid_stay_cleaning: bool,
    pub cancellation_insurance: bool,
    pub discount_amount: Decimal,
    pub discount_kind: DiscountKind,
}

/// Seasonal rates and option fees, sourced from the organization's pricing
/// settings. Months are 1-12.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub low_season_nightly_basis: Decimal,
    pub high_season_nightly_basis: Decimal,
    pub low_season_months: HashSet<u32>,
    pub linens_fee: Decimal,
    pub mid_stay_cleaning_fee: Decimal,
    pub cancellation_insurance_rate_percent: Decimal,
    pub tourist_tax_per_person_per_night: Decimal,
}

/// Fully itemized price for a stay. Every monetary field is independently
/// rounded to 2 decimals, half away from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub nights: i64,
    pub base_price: Decimal,
    pub discount: Decimal,
    pub net_base_after_discount: Decimal,
    pub linens_fee: Decimal,
    pub mid_stay_cleaning_fee: Decimal,
    pub cancellation_insurance_fee: Decimal,
    pub tourist_tax: Decimal,
    pub total_price: Decimal,
}

/// Price a stay against the seasonal configuration.
///
/// The season is decided solely by the month of `start_date`: a stay that
/// starts in a low-season month is billed entirely at the low-season rate,
/// whatever month it ends in. Cancellation insurance is priced on the
/// discounted base, not the gross base. The net base is deliberately not
/// clamped at zero when the discount exceeds the base.
///
/// Contract: the caller has already rejected non-positive date ranges.
/// A zero or negative night count is a programming error and panics.
pub fn calculate(stay: &StayRequest, config: &PricingConfig) -> PriceBreakdown {
    let nights = (stay.end_date - stay.start_date).num_days();
    assert!(
        nights >= 1,
        "stay must be at least one night (start {}, end {})",
        stay.start_date,
        stay.end_date
    );

    let season_basis = if config.low_season_months.contains(&stay.start_date.month()) {
        config.low_season_nightly_basis
    } else {
        config.high_season_nightly_basis
    };
    let nightly_rate = season_basis / Decimal::from(BASIS_NIGHTS);
    let base_price = Decimal::from(nights) * nightly_rate;

    let discount = match stay.discount_kind {
        DiscountKind::Percent => base_price * stay.discount_amount / Decimal::ONE_HUNDRED,
        DiscountKind::Amount | DiscountKind::Unspecified => stay.discount_amount,
    };
    let net_base_after_discount = base_price - discount;

    let linens_fee = if stay.linens {
        config.linens_fee
    } else {
        Decimal::ZERO
    };
    let mid_stay_cleaning_fee = if stay.mid_stay_cleaning {
        config.mid_stay_cleaning_fee
    } else {
        Decimal::ZERO
    };
    let cancellation_insurance_fee = if stay.cancellation_insurance {
        net_base_after_discount * config.cancellation_insurance_rate_percent
            / Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let persons = Decimal::from(i64::from(stay.adults) + i64::from(stay.children));
    let tourist_tax =
        persons * Decimal::from(nights) * config.tourist_tax_per_person_per_night;

    let total_price = base_price - discount
        + linens_fee
        + mid_stay_cleaning_fee
        + cancellation_insurance_fee
        + tourist_tax;

    PriceBreakdown {
        nights,
        base_price: round_money(base_price),
        discount: round_money(discount),
        net_base_after_discount: round_money(net_base_after_discount),
        linens_fee: round_money(linens_fee),
        mid_stay_cleaning_fee: round_money(mid_stay_cleaning_fee),
        cancellation_insurance_fee: round_money(cancellation_insurance_fee),
        tourist_tax: round_money(tourist_tax),
        total_price: round_money(total_price),
    }
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> PricingConfig {
        PricingConfig {
            low_season_nightly_basis: dec!(2100),
            high_season_nightly_basis: dec!(4200),
            low_season_months: [1, 2, 11, 12].into_iter().collect(),
            linens_fee: dec!(50),
            mid_stay_cleaning_fee: dec!(80),
            cancellation_insurance_rate_percent: dec!(5),
            tourist_tax_per_person_per_night: dec!(1.5),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(start: NaiveDate, end: NaiveDate) -> StayRequest {
        StayRequest {
            start_date: start,
            end_date: end,
            adults: 2,
            children: 0,
            linens: false,
            mid_stay_cleaning: false,
            cancellation_insurance: false,
            discount_amount: Decimal::ZERO,
            discount_kind: DiscountKind::Unspecified,
        }
    }

    #[test]
    fn prices_the_documented_week_long_example() {
        // 7 high-season nights at basis 4200/21 = 200... use basis 2100 in a
        // high month to get nightly 100 instead.
        let mut cfg = config();
        cfg.high_season_nightly_basis = dec!(2100);
        let mut request = stay(date(2025, 7, 5), date(2025, 7, 12));
        request.linens = true;
        request.mid_stay_cleaning = true;

        let breakdown = calculate(&request, &cfg);
        assert_eq!(breakdown.nights, 7);
        assert_eq!(breakdown.base_price, dec!(700.00));
        assert_eq!(breakdown.discount, dec!(0.00));
        assert_eq!(breakdown.linens_fee, dec!(50.00));
        assert_eq!(breakdown.mid_stay_cleaning_fee, dec!(80.00));
        assert_eq!(breakdown.cancellation_insurance_fee, dec!(0.00));
        assert_eq!(breakdown.tourist_tax, dec!(21.00));
        assert_eq!(breakdown.total_price, dec!(851.00));
    }

    #[test]
    fn season_depends_only_on_start_month() {
        // Dec 29 to Jan 5 starts in a low month and must price entirely at
        // the low rate even though it ends in a high month.
        let request = stay(date(2025, 12, 29), date(2026, 1, 5));
        let breakdown = calculate(&request, &config());
        // 7 nights at 2100/21 = 100
        assert_eq!(breakdown.base_price, dec!(700.00));

        // The mirror stay starting in January (also low season) keeps the
        // low rate; one starting in July does not.
        let july = stay(date(2025, 7, 29), date(2025, 8, 5));
        assert_eq!(calculate(&july, &config()).base_price, dec!(1400.00));
    }

    #[test]
    fn percent_discount_is_applied_on_base_price() {
        let mut request = stay(date(2026, 1, 3), date(2026, 1, 10));
        request.discount_amount = dec!(10);
        request.discount_kind = DiscountKind::Percent;
        let breakdown = calculate(&request, &config());
        assert_eq!(breakdown.base_price, dec!(700.00));
        assert_eq!(breakdown.discount, dec!(70.00));
        assert_eq!(breakdown.net_base_after_discount, dec!(630.00));
    }

    #[test]
    fn amount_discount_is_taken_verbatim() {
        let mut request = stay(date(2026, 1, 3), date(2026, 1, 10));
        request.discount_amount = dec!(100);
        request.discount_kind = DiscountKind::Amount;
        assert_eq!(calculate(&request, &config()).discount, dec!(100.00));
    }

    #[test]
    fn unspecified_discount_kind_falls_through_to_amount() {
        let mut request = stay(date(2026, 1, 3), date(2026, 1, 10));
        request.discount_amount = dec!(50);
        request.discount_kind = DiscountKind::Unspecified;
        assert_eq!(calculate(&request, &config()).discount, dec!(50.00));
    }

    #[test]
    fn insurance_is_priced_on_the_discounted_base() {
        let mut request = stay(date(2026, 1, 3), date(2026, 1, 10));
        request.discount_amount = dec!(10);
        request.discount_kind = DiscountKind::Percent;
        request.cancellation_insurance = true;
        let breakdown = calculate(&request, &config());
        // 5% of 630, not of 700.
        assert_eq!(breakdown.cancellation_insurance_fee, dec!(31.50));
    }

    #[test]
    fn tourist_tax_counts_every_guest_for_every_night() {
        let mut request = stay(date(2026, 1, 3), date(2026, 1, 10));
        request.adults = 2;
        request.children = 1;
        let breakdown = calculate(&request, &config());
        // (2 + 1) * 7 * 1.5
        assert_eq!(breakdown.tourist_tax, dec!(31.50));

        request.children = 2;
        let more = calculate(&request, &config());
        assert!(more.tourist_tax > breakdown.tourist_tax);
        assert_eq!(more.total_price - breakdown.total_price, dec!(10.50));
    }

    #[test]
    fn every_field_is_rounded_to_two_decimals() {
        let mut cfg = config();
        // 1000/21 repeats forever; 3 nights of it is 142.857142...
        cfg.low_season_nightly_basis = dec!(1000);
        cfg.cancellation_insurance_rate_percent = dec!(3.33);
        cfg.tourist_tax_per_person_per_night = dec!(0.77);
        let mut request = stay(date(2026, 2, 1), date(2026, 2, 4));
        request.cancellation_insurance = true;
        request.discount_amount = dec!(7.5);
        request.discount_kind = DiscountKind::Percent;

        let breakdown = calculate(&request, &cfg);
        assert_eq!(breakdown.base_price, dec!(142.86));
        for field in [
            breakdown.base_price,
            breakdown.discount,
            breakdown.net_base_after_discount,
            breakdown.linens_fee,
            breakdown.mid_stay_cleaning_fee,
            breakdown.cancellation_insurance_fee,
            breakdown.tourist_tax,
            breakdown.total_price,
        ] {
            assert!(field.scale() <= 2, "field {field} has more than 2 decimals");
        }
    }

    #[test]
    fn midpoints_round_away_from_zero() {
        let mut request = stay(date(2026, 1, 3), date(2026, 1, 10));
        // Net base 70.10 at 5% gives exactly 3.505.
        request.discount_amount = dec!(629.90);
        request.discount_kind = DiscountKind::Amount;
        request.cancellation_insurance = true;
        let breakdown = calculate(&request, &config());
        assert_eq!(breakdown.cancellation_insurance_fee, dec!(3.51));
    }

    #[test]
    fn net_base_is_not_clamped_when_discount_exceeds_base() {
        let mut request = stay(date(2026, 1, 3), date(2026, 1, 10));
        request.discount_amount = dec!(800);
        request.discount_kind = DiscountKind::Amount;
        let breakdown = calculate(&request, &config());
        assert_eq!(breakdown.net_base_after_discount, dec!(-100.00));
    }

    #[test]
    #[should_panic(expected = "at least one night")]
    fn zero_night_stay_is_a_contract_violation() {
        let request = stay(date(2026, 1, 3), date(2026, 1, 3));
        calculate(&request, &config());
    }

    #[test]
    fn discount_kind_parsing_falls_back_to_unspecified() {
        assert_eq!(DiscountKind::parse(Some("percent")), DiscountKind::Percent);
        assert_eq!(DiscountKind::parse(Some("amount")), DiscountKind::Amount);
        assert_eq!(DiscountKind::parse(Some("coupon")), DiscountKind::Unspecified);
        assert_eq!(DiscountKind::parse(None), DiscountKind::Unspecified);
    }
}
