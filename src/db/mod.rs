//! Storage ports and their Postgres implementation.
//!
//! The engines only see these traits; `PgStore` backs them in production.

#[cfg(test)]
pub mod memory;
mod queries;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::error::{DatabaseError, ErrorKind};
use uuid::Uuid;

use crate::models::{
    BlockedDate, BlockedDateListing, Booking, BookingListing, BookingStatus, InsertOutcome,
    NewBlockedDate, NewBooking, PricingUpdate, SiteSetting, Vehicle, VehicleCategory,
};

pub use queries::PgStore;

/// Storage error variants
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    AlreadyExists,

    #[error("referenced record does not exist")]
    InvalidReference,

    #[error("database error: {0}")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            _ => Self::Sql(error),
        }
    }
}

/// Vehicle catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_vehicles(&self, category: Option<VehicleCategory>) -> Result<Vec<Vehicle>, StoreError>;

    async fn vehicle_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError>;

    async fn vehicle_by_slug(&self, slug: &str) -> Result<Option<Vehicle>, StoreError>;

    /// Returns `false` when no vehicle has this id.
    async fn update_pricing(&self, id: Uuid, update: &PricingUpdate) -> Result<bool, StoreError>;
}

/// Whole-day blocks
#[async_trait]
pub trait BlockedDateStore: Send + Sync {
    async fn is_blocked(&self, vehicle_id: Uuid, date: NaiveDate) -> Result<bool, StoreError>;

    async fn list_blocked(&self) -> Result<Vec<BlockedDateListing>, StoreError>;

    async fn create_blocked(&self, blocked: &NewBlockedDate) -> Result<BlockedDate, StoreError>;

    async fn delete_blocked(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Bookings
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Active-hold bookings of a vehicle whose range touches `date`
    async fn active_bookings_on(&self, vehicle_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>, StoreError>;

    async fn booking_by_id(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn booking_by_session(&self, checkout_session_id: &str) -> Result<Option<Booking>, StoreError>;

    async fn list_bookings(&self) -> Result<Vec<BookingListing>, StoreError>;

    /// Insert unless the checkout session already produced a booking.
    async fn insert_booking(&self, booking: &NewBooking) -> Result<InsertOutcome, StoreError>;

    /// Compare-and-set on status. Returns `false` when the booking is
    /// missing or no longer in `from`.
    async fn transition_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, StoreError>;
}

/// Key/value site settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn list_settings(&self) -> Result<Vec<SiteSetting>, StoreError>;

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Everything the application needs from storage
pub trait Store: CatalogStore + BlockedDateStore + BookingStore + SettingsStore {}

impl<T> Store for T where T: CatalogStore + BlockedDateStore + BookingStore + SettingsStore {}

/// Look a vehicle up by id, falling back to its slug.
pub async fn find_vehicle<S: CatalogStore + ?Sized>(store: &S, key: &str) -> Result<Option<Vehicle>, StoreError> {
    match Uuid::parse_str(key) {
        Ok(id) => store.vehicle_by_id(id).await,
        Err(_) => store.vehicle_by_slug(key).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sql_errors_stay_sql() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Sql(_)));

        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(err.to_string().contains("database error"));
    }

    #[tokio::test]
    async fn test_find_vehicle_by_id_or_slug() {
        let bus = memory::fixtures::prevost_bus();
        let store = memory::MemoryStore::with_vehicles(vec![bus.clone()]);

        let by_id = find_vehicle(&store, &bus.id.to_string()).await.unwrap();
        assert_eq!(by_id.map(|v| v.id), Some(bus.id));

        let by_slug = find_vehicle(&store, "prevost-tour-bus").await.unwrap();
        assert_eq!(by_slug.map(|v| v.id), Some(bus.id));

        assert!(find_vehicle(&store, "submarine").await.unwrap().is_none());
        assert!(find_vehicle(&store, &Uuid::new_v4().to_string()).await.unwrap().is_none());
    }
}
