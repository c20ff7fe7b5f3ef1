//! Booking models and the booking status machine

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::hhmm;

/// Booking status.
///
/// `PendingApproval` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingApproval,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Statuses whose time range is held against availability
    pub const ACTIVE_HOLD: [BookingStatus; 2] = [BookingStatus::PendingApproval, BookingStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingApproval => "pending_approval",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_active_hold(&self) -> bool {
        Self::ACTIVE_HOLD.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::PendingApproval)
    }

    /// Whether `self -> next` is an allowed transition.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::PendingApproval, BookingStatus::Confirmed)
                | (BookingStatus::PendingApproval, BookingStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_approval" => Ok(BookingStatus::PendingApproval),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking status '{0}'")]
pub struct UnknownStatus(pub String);

/// Booking from the `bookings` table
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub end_date: Option<NaiveDate>,
    pub guest_count: i32,
    pub notes: Option<String>,
    /// Authorized amount in cents
    pub total_price: i64,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub checkout_session_id: String,
    pub payment_intent_id: Option<String>,
}

impl Booking {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.last_date().and_time(self.end_time)
    }

    /// Last calendar date the booking touches
    pub fn last_date(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.date)
    }
}

/// Booking with its vehicle name, for admin listings
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub vehicle_name: String,
}

/// Validated booking ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub vehicle_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub end_date: Option<NaiveDate>,
    pub guest_count: i32,
    pub notes: Option<String>,
    pub total_price: i64,
    pub checkout_session_id: String,
    pub payment_intent_id: Option<String>,
}

/// Result of an idempotent insert keyed on the checkout session id
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Created(Booking),
    Duplicate,
}
