//! Booking lifecycle: creation from payment authorizations and admin
//! resolution through capture or release.

pub mod lifecycle;

pub use lifecycle::{BookingLifecycle, Recorded};

use crate::db::StoreError;
use crate::payments::PaymentError;

/// Booking lifecycle error types
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Authorization event that cannot become a booking; acknowledged and dropped
    #[error("unusable payment event: {0}")]
    InvalidEvent(String),

    #[error("Booking not found")]
    NotFound,

    #[error("Booking is not pending approval")]
    NotPending,

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
