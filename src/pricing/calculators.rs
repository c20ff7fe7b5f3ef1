//! Core pricing calculation functions.
//!
//! Pure functions for rental duration and price math - no database access.

use chrono::NaiveDateTime;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Round to specified decimal places, halves away from zero.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use atx_rentals_web::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(3));
/// assert_eq!(round_money(dec!(-2.5), 0), dec!(-3));
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount to integer cents.
///
/// This is the only place money becomes an integer.
pub fn to_cents(amount: Decimal) -> Option<i64> {
    round_money(amount * Decimal::ONE_HUNDRED, 0).to_i64()
}

/// Length of a rental in hours (fractional when minutes don't line up).
pub fn rental_hours(start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
    Decimal::from((end - start).num_minutes()) / Decimal::from(60)
}

/// Rental length outside the vehicle's bounds
#[derive(Debug, Clone, PartialEq)]
pub enum DurationError {
    NotPositive,
    BelowMinimum { minimum_hours: i32 },
    AboveMaximum { maximum_hours: i32 },
}

impl std::fmt::Display for DurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationError::NotPositive => write!(f, "End time must be after start time"),
            DurationError::BelowMinimum { minimum_hours } => {
                write!(f, "Booking must be at least {} hours", minimum_hours)
            }
            DurationError::AboveMaximum { maximum_hours } => {
                write!(f, "Booking cannot exceed {} hours", maximum_hours)
            }
        }
    }
}

impl std::error::Error for DurationError {}

/// Check a rental length against the vehicle's minimum and maximum hours.
pub fn validate_duration(hours: Decimal, minimum_hours: i32, maximum_hours: i32) -> Result<(), DurationError> {
    if hours <= Decimal::ZERO {
        return Err(DurationError::NotPositive);
    }
    if hours < Decimal::from(minimum_hours) {
        return Err(DurationError::BelowMinimum { minimum_hours });
    }
    if hours > Decimal::from(maximum_hours) {
        return Err(DurationError::AboveMaximum { maximum_hours });
    }
    Ok(())
}

/// Price breakdown for a rental, in major currency units
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub hours: Decimal,
    pub base: Decimal,
    pub fuel: Decimal,
    pub total: Decimal,
}

impl PriceQuote {
    pub fn total_cents(&self) -> Option<i64> {
        to_cents(self.total)
    }
}

/// Price a rental: `hours x rate`, plus the fuel surcharge when enabled.
///
/// Nothing is rounded here; see [`to_cents`].
pub fn quote(hours: Decimal, price_per_hour: Decimal, fuel_charge_percent: Decimal, fuel_enabled: bool) -> PriceQuote {
    let base = hours * price_per_hour;
    let fuel = if fuel_enabled {
        base * fuel_charge_percent / Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    PriceQuote {
        hours,
        base,
        fuel,
        total: base + fuel,
    }
}
