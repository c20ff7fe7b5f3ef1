//! In-memory store for unit and router tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::models::{
    BlockedDate, BlockedDateListing, Booking, BookingListing, BookingStatus, InsertOutcome,
    NewBlockedDate, NewBooking, PricingUpdate, SiteSetting, Vehicle, VehicleCategory,
};

use super::{BlockedDateStore, BookingStore, CatalogStore, SettingsStore, StoreError};

#[derive(Default)]
struct Tables {
    vehicles: Vec<Vehicle>,
    blocked: Vec<BlockedDate>,
    bookings: Vec<Booking>,
    settings: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicles(vehicles: Vec<Vehicle>) -> Self {
        let store = Self::new();
        store.tables.lock().unwrap().vehicles = vehicles;
        store
    }

    pub fn add_booking(&self, booking: Booking) {
        self.tables.lock().unwrap().bookings.push(booking);
    }

    pub fn add_blocked(&self, vehicle_id: Uuid, date: NaiveDate) {
        self.tables.lock().unwrap().blocked.push(BlockedDate {
            id: Uuid::new_v4(),
            vehicle_id,
            date,
            reason: None,
        });
    }

    pub fn set(&self, key: &str, value: &str) {
        self.tables
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), value.to_string());
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.tables.lock().unwrap().bookings.clone()
    }

    fn vehicle_name(tables: &Tables, id: Uuid) -> String {
        tables
            .vehicles
            .iter()
            .find(|v| v.id == id)
            .map(|v| v.name.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_vehicles(&self, category: Option<VehicleCategory>) -> Result<Vec<Vehicle>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .iter()
            .filter(|v| category.map_or(true, |c| v.category == c))
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vehicles)
    }

    async fn vehicle_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.vehicles.iter().find(|v| v.id == id).cloned())
    }

    async fn vehicle_by_slug(&self, slug: &str) -> Result<Option<Vehicle>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.vehicles.iter().find(|v| v.slug == slug).cloned())
    }

    async fn update_pricing(&self, id: Uuid, update: &PricingUpdate) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(vehicle) = tables.vehicles.iter_mut().find(|v| v.id == id) else {
            return Ok(false);
        };
        vehicle.price_per_hour = update.price_per_hour;
        vehicle.minimum_hours = update.minimum_hours;
        vehicle.maximum_hours = update.maximum_hours;
        vehicle.fuel_charge_percent = update.fuel_charge_percent;
        Ok(true)
    }
}

#[async_trait]
impl BlockedDateStore for MemoryStore {
    async fn is_blocked(&self, vehicle_id: Uuid, date: NaiveDate) -> Result<bool, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .blocked
            .iter()
            .any(|b| b.vehicle_id == vehicle_id && b.date == date))
    }

    async fn list_blocked(&self) -> Result<Vec<BlockedDateListing>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut listings: Vec<BlockedDateListing> = tables
            .blocked
            .iter()
            .map(|b| BlockedDateListing {
                blocked: b.clone(),
                vehicle_name: Self::vehicle_name(&tables, b.vehicle_id),
            })
            .collect();
        listings.sort_by(|a, b| b.blocked.date.cmp(&a.blocked.date));
        Ok(listings)
    }

    async fn create_blocked(&self, blocked: &NewBlockedDate) -> Result<BlockedDate, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.vehicles.iter().any(|v| v.id == blocked.vehicle_id) {
            return Err(StoreError::InvalidReference);
        }
        if tables
            .blocked
            .iter()
            .any(|b| b.vehicle_id == blocked.vehicle_id && b.date == blocked.date)
        {
            return Err(StoreError::AlreadyExists);
        }

        let created = BlockedDate {
            id: Uuid::new_v4(),
            vehicle_id: blocked.vehicle_id,
            date: blocked.date,
            reason: blocked.reason.clone(),
        };
        tables.blocked.push(created.clone());
        Ok(created)
    }

    async fn delete_blocked(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.blocked.len();
        tables.blocked.retain(|b| b.id != id);
        Ok(tables.blocked.len() < before)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn active_bookings_on(&self, vehicle_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .bookings
            .iter()
            .filter(|b| {
                b.vehicle_id == vehicle_id
                    && b.status.is_active_hold()
                    && b.date <= date
                    && b.last_date() >= date
            })
            .cloned()
            .collect())
    }

    async fn booking_by_id(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn booking_by_session(&self, checkout_session_id: &str) -> Result<Option<Booking>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .bookings
            .iter()
            .find(|b| b.checkout_session_id == checkout_session_id)
            .cloned())
    }

    async fn list_bookings(&self) -> Result<Vec<BookingListing>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut listings: Vec<BookingListing> = tables
            .bookings
            .iter()
            .map(|b| BookingListing {
                booking: b.clone(),
                vehicle_name: Self::vehicle_name(&tables, b.vehicle_id),
            })
            .collect();
        listings.sort_by(|a, b| b.booking.starts_at().cmp(&a.booking.starts_at()));
        Ok(listings)
    }

    async fn insert_booking(&self, booking: &NewBooking) -> Result<InsertOutcome, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .bookings
            .iter()
            .any(|b| b.checkout_session_id == booking.checkout_session_id)
        {
            return Ok(InsertOutcome::Duplicate);
        }
        if !tables.vehicles.iter().any(|v| v.id == booking.vehicle_id) {
            return Err(StoreError::InvalidReference);
        }

        let created = Booking {
            id: Uuid::new_v4(),
            vehicle_id: booking.vehicle_id,
            customer_name: booking.customer_name.clone(),
            customer_email: booking.customer_email.clone(),
            customer_phone: booking.customer_phone.clone(),
            date: booking.date,
            start_time: booking.start_time,
            end_time: booking.end_time,
            end_date: booking.end_date,
            guest_count: booking.guest_count,
            notes: booking.notes.clone(),
            total_price: booking.total_price,
            status: BookingStatus::PendingApproval,
            created_at: Utc::now(),
            checkout_session_id: booking.checkout_session_id.clone(),
            payment_intent_id: booking.payment_intent_id.clone(),
        };
        tables.bookings.push(created.clone());
        Ok(InsertOutcome::Created(created))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.bookings.iter_mut().find(|b| b.id == id && b.status == from) {
            Some(booking) => {
                booking.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.tables.lock().unwrap().settings.get(key).cloned())
    }

    async fn list_settings(&self) -> Result<Vec<SiteSetting>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .settings
            .iter()
            .map(|(key, value)| SiteSetting {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set(key, value);
        Ok(())
    }
}

pub mod fixtures {
    use super::*;
    use chrono::NaiveTime;

    pub fn prevost_bus() -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            name: "45 Foot Prevost Tour Bus".to_string(),
            slug: "prevost-tour-bus".to_string(),
            category: VehicleCategory::Bus,
            description: "Flagship tour bus".to_string(),
            capacity: 23,
            price_per_hour: dec!(400),
            minimum_hours: 3,
            maximum_hours: 48,
            fuel_charge_percent: dec!(20),
            features: vec!["Private Bathroom".to_string()],
            images: vec!["/images/bus-1.jpg".to_string()],
        }
    }

    pub fn carver_yacht() -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            name: "50 Foot Carver Yacht".to_string(),
            slug: "carver-yacht".to_string(),
            category: VehicleCategory::Boat,
            description: "Lake Travis yacht".to_string(),
            capacity: 20,
            price_per_hour: dec!(700),
            minimum_hours: 3,
            maximum_hours: 4,
            fuel_charge_percent: dec!(0),
            features: vec!["Swim Platform".to_string()],
            images: vec![],
        }
    }

    pub fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, day).unwrap()
    }

    pub fn time(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    /// Pending booking of `vehicle_id` from `start_day start_hour` to `end_day end_hour`
    pub fn booking(vehicle_id: Uuid, start_day: u32, start_hour: u32, end_day: u32, end_hour: u32) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            vehicle_id,
            customer_name: "Pat Doe".to_string(),
            customer_email: "pat@example.com".to_string(),
            customer_phone: "555-0100".to_string(),
            date: date(start_day),
            start_time: time(start_hour),
            end_time: time(end_hour),
            end_date: (end_day != start_day).then(|| date(end_day)),
            guest_count: 10,
            notes: None,
            total_price: 144_000,
            status: BookingStatus::PendingApproval,
            created_at: Utc::now(),
            checkout_session_id: format!("cs_{}", Uuid::new_v4().simple()),
            payment_intent_id: Some(format!("pi_{}", Uuid::new_v4().simple())),
        }
    }
}
