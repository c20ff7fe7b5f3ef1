//! Domain models shared by the stores, the engines and the HTTP layer

pub mod blocked;
pub mod booking;
pub mod settings;
pub mod vehicle;

pub use blocked::{BlockedDate, BlockedDateListing, NewBlockedDate};
pub use booking::{Booking, BookingListing, BookingStatus, InsertOutcome, NewBooking};
pub use settings::{SiteSetting, FUEL_CHARGE_ENABLED};
pub use vehicle::{PricingUpdate, Vehicle, VehicleCategory};

/// `HH:MM` (de)serialization for wall-clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}'", raw)))
    }

    /// Parse a strict two-digit `HH:MM` value.
    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let bytes = raw.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return None;
        }
        NaiveTime::parse_from_str(raw, FORMAT).ok()
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(raw: &str) -> Option<chrono::NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
