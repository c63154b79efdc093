use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle states. Date ranges are half-open `[start, end)`:
/// the checkout day is free for the next arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Blocked,
}

impl BookingStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Blocked => "blocked",
        }
    }

    /// Whether a booking in this state blocks new reservations. Blocked
    /// ranges occupy the calendar but never reject a proposed stay.
    pub fn blocks_availability(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether a booking in this state occupies days on the calendar and in
    /// occupancy statistics.
    pub fn occupies_calendar(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Blocked)
    }
}

/// An existing booking's date range, as loaded from storage.
#[derive(Debug, Clone)]
pub struct BookingInterval {
    pub id: Uuid,
    pub property_id: Uuid,
    pub client_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
}

/// A stay being checked for conflicts. `exclude_booking_id` is set when
/// re-checking a booking that is being edited, so it never conflicts with
/// itself.
#[derive(Debug, Clone)]
pub struct ProposedStay {
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub client_id: Option<Uuid>,
    pub exclude_booking_id: Option<Uuid>,
}

/// How a proposed stay collides with an existing booking. Each case maps to
/// a distinct message in the booking screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    ArrivalDuringExistingStay,
    DepartureDuringExistingStay,
    ExistingStayContained,
}

impl ConflictKind {
    pub fn message(self) -> &'static str {
        match self {
            Self::ArrivalDuringExistingStay => "arrival falls during an existing stay",
            Self::DepartureDuringExistingStay => "departure falls during an existing stay",
            Self::ExistingStayContained => "an existing stay is fully inside the selected dates",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    pub booking_id: Uuid,
    pub overlap_start: NaiveDate,
    pub overlap_end: NaiveDate,
    pub kind: ConflictKind,
    pub is_same_client: bool,
}

/// Report every existing booking whose half-open range intersects the
/// proposed one. Only pending and confirmed bookings on the same property
/// are candidates; cancelled and blocked bookings never block.
///
/// `is_same_client` lets the caller decide whether a client extending their
/// own stay should be allowed through; the engine only reports it.
pub fn find_conflicts(proposed: &ProposedStay, existing: &[BookingInterval]) -> Vec<Conflict> {
    existing
        .iter()
        .filter(|booking| booking.property_id == proposed.property_id)
        .filter(|booking| booking.status.blocks_availability())
        .filter(|booking| Some(booking.id) != proposed.exclude_booking_id)
        .filter_map(|booking| {
            let kind = classify_overlap(
                booking.start_date,
                booking.end_date,
                proposed.start_date,
                proposed.end_date,
            )?;
            Some(Conflict {
                booking_id: booking.id,
                overlap_start: booking.start_date.max(proposed.start_date),
                overlap_end: booking.end_date.min(proposed.end_date),
                kind,
                is_same_client: match (booking.client_id, proposed.client_id) {
                    (Some(theirs), Some(ours)) => theirs == ours,
                    _ => false,
                },
            })
        })
        .collect()
}

/// The three named overlap cases for half-open intervals. Their union is
/// equivalent to the plain `e_start < p_end && e_end > p_start` test; the
/// cases are kept separate so callers can say why a conflict happened.
fn classify_overlap(
    e_start: NaiveDate,
    e_end: NaiveDate,
    p_start: NaiveDate,
    p_end: NaiveDate,
) -> Option<ConflictKind> {
    if e_start <= p_start && e_end > p_start {
        Some(ConflictKind::ArrivalDuringExistingStay)
    } else if e_start < p_end && e_end >= p_end {
        Some(ConflictKind::DepartureDuringExistingStay)
    } else if e_start >= p_start && e_end <= p_end {
        Some(ConflictKind::ExistingStayContained)
    } else {
        None
    }
}

/// Distinct calendar days within `[period_start, period_end)` occupied by at
/// least one pending, confirmed, or blocked booking. Intervals are clipped
/// to the period; the end day of each clipped interval is excluded,
/// consistent with the half-open model. An inverted period yields an empty
/// set, not an error.
pub fn occupied_days(
    period_start: NaiveDate,
    period_end: NaiveDate,
    bookings: &[BookingInterval],
) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    if period_start >= period_end {
        return days;
    }

    for booking in bookings {
        if !booking.status.occupies_calendar() {
            continue;
        }
        let clipped_start = booking.start_date.max(period_start);
        let clipped_end = booking.end_date.min(period_end);
        let mut day = clipped_start;
        while day < clipped_end {
            days.insert(day);
            day += chrono::Duration::days(1);
        }
    }

    days
}

/// Occupancy rate over a period: occupied days out of the total day slots
/// available across all properties. Returns 0 for an empty denominator.
pub fn occupancy_rate(occupied_day_count: u64, days_in_period: u64, property_count: u64) -> f64 {
    let available = days_in_period * property_count;
    if available == 0 {
        return 0.0;
    }
    occupied_day_count as f64 / available as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn property() -> Uuid {
        Uuid::from_u128(1)
    }

    fn booking(start: NaiveDate, end: NaiveDate, status: BookingStatus) -> BookingInterval {
        BookingInterval {
            id: Uuid::new_v4(),
            property_id: property(),
            client_id: None,
            start_date: start,
            end_date: end,
            status,
        }
    }

    fn proposed(start: NaiveDate, end: NaiveDate) -> ProposedStay {
        ProposedStay {
            property_id: property(),
            start_date: start,
            end_date: end,
            client_id: None,
            exclude_booking_id: None,
        }
    }

    #[test]
    fn back_to_back_bookings_do_not_conflict() {
        let existing = vec![booking(
            date(2025, 6, 1),
            date(2025, 6, 8),
            BookingStatus::Confirmed,
        )];
        // New arrival on the existing checkout day.
        let conflicts = find_conflicts(&proposed(date(2025, 6, 8), date(2025, 6, 15)), &existing);
        assert!(conflicts.is_empty());
        // And the mirror case: checkout on the existing arrival day.
        let conflicts = find_conflicts(&proposed(date(2025, 5, 25), date(2025, 6, 1)), &existing);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn classifies_arrival_inside_an_existing_stay() {
        let existing = vec![booking(
            date(2025, 6, 1),
            date(2025, 6, 8),
            BookingStatus::Confirmed,
        )];
        let conflicts = find_conflicts(&proposed(date(2025, 6, 5), date(2025, 6, 12)), &existing);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::ArrivalDuringExistingStay);
        assert_eq!(conflicts[0].overlap_start, date(2025, 6, 5));
        assert_eq!(conflicts[0].overlap_end, date(2025, 6, 8));
    }

    #[test]
    fn classifies_departure_inside_an_existing_stay() {
        let existing = vec![booking(
            date(2025, 6, 10),
            date(2025, 6, 20),
            BookingStatus::Pending,
        )];
        let conflicts = find_conflicts(&proposed(date(2025, 6, 5), date(2025, 6, 12)), &existing);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::DepartureDuringExistingStay);
    }

    #[test]
    fn classifies_an_existing_stay_contained_in_the_proposal() {
        let existing = vec![booking(
            date(2025, 6, 10),
            date(2025, 6, 12),
            BookingStatus::Confirmed,
        )];
        let conflicts = find_conflicts(&proposed(date(2025, 6, 5), date(2025, 6, 20)), &existing);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::ExistingStayContained);
    }

    #[test]
    fn named_cases_cover_exactly_the_general_overlap_test() {
        // Slide a 3-night window across a fixed 5-night booking and check
        // the classification agrees with the plain half-open overlap test.
        let e_start = date(2025, 6, 10);
        let e_end = date(2025, 6, 15);
        for offset in -6..=8 {
            let p_start = date(2025, 6, 10) + chrono::Duration::days(offset);
            let p_end = p_start + chrono::Duration::days(3);
            let classified = classify_overlap(e_start, e_end, p_start, p_end).is_some();
            let overlaps = e_start < p_end && e_end > p_start;
            assert_eq!(classified, overlaps, "offset {offset}");
        }
    }

    #[test]
    fn cancelled_and_blocked_bookings_never_block() {
        let existing = vec![
            booking(date(2025, 6, 1), date(2025, 6, 8), BookingStatus::Cancelled),
            booking(date(2025, 6, 1), date(2025, 6, 8), BookingStatus::Blocked),
        ];
        let conflicts = find_conflicts(&proposed(date(2025, 6, 2), date(2025, 6, 6)), &existing);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn other_properties_are_not_candidates() {
        let mut other = booking(date(2025, 6, 1), date(2025, 6, 8), BookingStatus::Confirmed);
        other.property_id = Uuid::from_u128(2);
        let conflicts = find_conflicts(&proposed(date(2025, 6, 2), date(2025, 6, 6)), &[other]);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn an_edited_booking_does_not_conflict_with_itself() {
        let existing = booking(date(2025, 6, 1), date(2025, 6, 8), BookingStatus::Confirmed);
        let mut stay = proposed(date(2025, 6, 1), date(2025, 6, 10));
        stay.exclude_booking_id = Some(existing.id);
        assert!(find_conflicts(&stay, &[existing]).is_empty());
    }

    #[test]
    fn reports_whether_the_conflicting_booking_belongs_to_the_same_client() {
        let client = Uuid::from_u128(42);
        let mut existing = booking(date(2025, 6, 1), date(2025, 6, 8), BookingStatus::Confirmed);
        existing.client_id = Some(client);

        let mut stay = proposed(date(2025, 6, 5), date(2025, 6, 12));
        stay.client_id = Some(client);
        let conflicts = find_conflicts(&stay, std::slice::from_ref(&existing));
        assert!(conflicts[0].is_same_client);

        stay.client_id = Some(Uuid::from_u128(43));
        let conflicts = find_conflicts(&stay, std::slice::from_ref(&existing));
        assert!(!conflicts[0].is_same_client);
    }

    #[test]
    fn occupied_days_of_a_fully_contained_booking_are_its_nights() {
        let bookings = vec![booking(
            date(2025, 6, 10),
            date(2025, 6, 13),
            BookingStatus::Confirmed,
        )];
        let days = occupied_days(date(2025, 6, 1), date(2025, 7, 1), &bookings);
        let expected: BTreeSet<NaiveDate> =
            [date(2025, 6, 10), date(2025, 6, 11), date(2025, 6, 12)]
                .into_iter()
                .collect();
        assert_eq!(days, expected);
    }

    #[test]
    fn occupied_days_are_clipped_to_the_period() {
        // Booking starts before the period; only the in-period days count.
        let bookings = vec![booking(
            date(2025, 5, 28),
            date(2025, 6, 3),
            BookingStatus::Confirmed,
        )];
        let days = occupied_days(date(2025, 6, 1), date(2025, 7, 1), &bookings);
        let expected: BTreeSet<NaiveDate> =
            [date(2025, 6, 1), date(2025, 6, 2)].into_iter().collect();
        assert_eq!(days, expected);
    }

    #[test]
    fn blocked_bookings_occupy_the_calendar() {
        let bookings = vec![
            booking(date(2025, 6, 10), date(2025, 6, 12), BookingStatus::Blocked),
            booking(date(2025, 6, 10), date(2025, 6, 12), BookingStatus::Cancelled),
        ];
        let days = occupied_days(date(2025, 6, 1), date(2025, 7, 1), &bookings);
        assert_eq!(days.len(), 2);
    }

    #[test]
    fn overlapping_bookings_count_each_day_once() {
        let bookings = vec![
            booking(date(2025, 6, 10), date(2025, 6, 14), BookingStatus::Confirmed),
            booking(date(2025, 6, 12), date(2025, 6, 16), BookingStatus::Pending),
        ];
        let days = occupied_days(date(2025, 6, 1), date(2025, 7, 1), &bookings);
        assert_eq!(days.len(), 6);
    }

    #[test]
    fn empty_input_and_inverted_periods_yield_empty_sets() {
        assert!(occupied_days(date(2025, 6, 1), date(2025, 7, 1), &[]).is_empty());
        let bookings = vec![booking(
            date(2025, 6, 10),
            date(2025, 6, 13),
            BookingStatus::Confirmed,
        )];
        assert!(occupied_days(date(2025, 7, 1), date(2025, 6, 1), &bookings).is_empty());
    }

    #[test]
    fn occupancy_rate_spreads_over_all_properties() {
        assert_eq!(occupancy_rate(15, 30, 1), 0.5);
        assert_eq!(occupancy_rate(15, 30, 2), 0.25);
        assert_eq!(occupancy_rate(0, 0, 5), 0.0);
    }
}
