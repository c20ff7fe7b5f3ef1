//! Postgres queries for the catalog, blocks, bookings and settings

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    BlockedDate, BlockedDateListing, Booking, BookingListing, BookingStatus, InsertOutcome,
    NewBlockedDate, NewBooking, PricingUpdate, SiteSetting, Vehicle, VehicleCategory,
};

use super::{BlockedDateStore, BookingStore, CatalogStore, SettingsStore, StoreError};

/// Postgres-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_vehicles(&self, category: Option<VehicleCategory>) -> Result<Vec<Vehicle>, StoreError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT
                id, name, slug, category, description, capacity,
                price_per_hour, minimum_hours, maximum_hours,
                fuel_charge_percent, features, images
            FROM vehicles
            WHERE ($1::text IS NULL OR category = $1)
            ORDER BY name
            "#,
        )
        .bind(category.map(|c| c.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn vehicle_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT
                id, name, slug, category, description, capacity,
                price_per_hour, minimum_hours, maximum_hours,
                fuel_charge_percent, features, images
            FROM vehicles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn vehicle_by_slug(&self, slug: &str) -> Result<Option<Vehicle>, StoreError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT
                id, name, slug, category, description, capacity,
                price_per_hour, minimum_hours, maximum_hours,
                fuel_charge_percent, features, images
            FROM vehicles
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn update_pricing(&self, id: Uuid, update: &PricingUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET price_per_hour = $2,
                minimum_hours = $3,
                maximum_hours = $4,
                fuel_charge_percent = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.price_per_hour)
        .bind(update.minimum_hours)
        .bind(update.maximum_hours)
        .bind(update.fuel_charge_percent)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl BlockedDateStore for PgStore {
    async fn is_blocked(&self, vehicle_id: Uuid, date: NaiveDate) -> Result<bool, StoreError> {
        let blocked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM blocked_dates
                WHERE vehicle_id = $1 AND date = $2
            )
            "#,
        )
        .bind(vehicle_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(blocked)
    }

    async fn list_blocked(&self) -> Result<Vec<BlockedDateListing>, StoreError> {
        let blocked = sqlx::query_as::<_, BlockedDateListing>(
            r#"
            SELECT bd.id, bd.vehicle_id, bd.date, bd.reason, v.name AS vehicle_name
            FROM blocked_dates bd
            JOIN vehicles v ON v.id = bd.vehicle_id
            ORDER BY bd.date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(blocked)
    }

    async fn create_blocked(&self, blocked: &NewBlockedDate) -> Result<BlockedDate, StoreError> {
        let created = sqlx::query_as::<_, BlockedDate>(
            r#"
            INSERT INTO blocked_dates (vehicle_id, date, reason)
            VALUES ($1, $2, $3)
            RETURNING id, vehicle_id, date, reason
            "#,
        )
        .bind(blocked.vehicle_id)
        .bind(blocked.date)
        .bind(blocked.reason.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete_blocked(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM blocked_dates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn active_bookings_on(&self, vehicle_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        let statuses: Vec<&str> = BookingStatus::ACTIVE_HOLD.iter().map(|s| s.as_str()).collect();

        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT
                id, vehicle_id, customer_name, customer_email, customer_phone,
                date, start_time, end_time, end_date, guest_count, notes,
                total_price, status, created_at,
                checkout_session_id, payment_intent_id
            FROM bookings
            WHERE vehicle_id = $1
              AND date <= $2
              AND COALESCE(end_date, date) >= $2
              AND status = ANY($3)
            ORDER BY date, start_time
            "#,
        )
        .bind(vehicle_id)
        .bind(date)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn booking_by_id(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT
                id, vehicle_id, customer_name, customer_email, customer_phone,
                date, start_time, end_time, end_date, guest_count, notes,
                total_price, status, created_at,
                checkout_session_id, payment_intent_id
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn booking_by_session(&self, checkout_session_id: &str) -> Result<Option<Booking>, StoreError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT
                id, vehicle_id, customer_name, customer_email, customer_phone,
                date, start_time, end_time, end_date, guest_count, notes,
                total_price, status, created_at,
                checkout_session_id, payment_intent_id
            FROM bookings
            WHERE checkout_session_id = $1
            "#,
        )
        .bind(checkout_session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn list_bookings(&self) -> Result<Vec<BookingListing>, StoreError> {
        let bookings = sqlx::query_as::<_, BookingListing>(
            r#"
            SELECT
                b.id, b.vehicle_id, b.customer_name, b.customer_email, b.customer_phone,
                b.date, b.start_time, b.end_time, b.end_date, b.guest_count, b.notes,
                b.total_price, b.status, b.created_at,
                b.checkout_session_id, b.payment_intent_id,
                v.name AS vehicle_name
            FROM bookings b
            JOIN vehicles v ON v.id = b.vehicle_id
            ORDER BY b.date DESC, b.start_time DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn insert_booking(&self, booking: &NewBooking) -> Result<InsertOutcome, StoreError> {
        // A duplicate session id hits the conflict clause and returns no row
        let inserted = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                vehicle_id, customer_name, customer_email, customer_phone,
                date, start_time, end_time, end_date, guest_count, notes,
                total_price, status, checkout_session_id, payment_intent_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending_approval', $12, $13)
            ON CONFLICT (checkout_session_id) DO NOTHING
            RETURNING
                id, vehicle_id, customer_name, customer_email, customer_phone,
                date, start_time, end_time, end_date, guest_count, notes,
                total_price, status, created_at,
                checkout_session_id, payment_intent_id
            "#,
        )
        .bind(booking.vehicle_id)
        .bind(&booking.customer_name)
        .bind(&booking.customer_email)
        .bind(&booking.customer_phone)
        .bind(booking.date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.end_date)
        .bind(booking.guest_count)
        .bind(booking.notes.as_deref())
        .bind(booking.total_price)
        .bind(&booking.checkout_session_id)
        .bind(booking.payment_intent_id.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(created) => InsertOutcome::Created(created),
            None => InsertOutcome::Duplicate,
        })
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $3
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM site_settings WHERE key = $1 LIMIT 1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn list_settings(&self) -> Result<Vec<SiteSetting>, StoreError> {
        let settings = sqlx::query_as::<_, SiteSetting>(
            "SELECT key, value FROM site_settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO site_settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
