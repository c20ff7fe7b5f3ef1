//! Availability engine.
//!
//! Answers which hourly slots of a vehicle are open on a date, and whether a
//! requested rental range is still free at checkout time.

pub mod slots;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{find_vehicle, BlockedDateStore, BookingStore, CatalogStore, StoreError};
use crate::models::Vehicle;

pub use slots::{
    end_time_options, filter_return_slots, generate_slots, return_date_options, TimeSlot, CLOSE_HOUR,
    OPEN_HOUR,
};

/// Availability engine error types
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Vehicle not found")]
    VehicleNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Slots of one vehicle on one date
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
    pub is_blocked: bool,
    pub slots: Vec<TimeSlot>,
}

/// A vehicle together with its slots on one date
#[derive(Debug, Clone)]
pub struct VehicleDay {
    pub vehicle: Vehicle,
    pub availability: DayAvailability,
}

impl VehicleDay {
    /// End times selectable from `start` within the vehicle's duration bounds
    pub fn end_options(&self, start: NaiveTime) -> Vec<NaiveTime> {
        end_time_options(
            &self.availability.slots,
            start,
            self.vehicle.minimum_hours,
            self.vehicle.maximum_hours,
        )
    }
}

/// Return choices for a multi-day rental picked up at `pickup`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOptions {
    pub vehicle_id: Uuid,
    pub return_dates: Vec<NaiveDate>,
    /// Filtered slots of the requested return date, when one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_slots: Option<Vec<TimeSlot>>,
}

/// Slot availability of a vehicle (by id or slug) on a date.
pub async fn get_availability<S>(store: &S, vehicle_key: &str, date: NaiveDate) -> Result<VehicleDay, AvailabilityError>
where
    S: CatalogStore + BlockedDateStore + BookingStore + ?Sized,
{
    let vehicle = find_vehicle(store, vehicle_key)
        .await?
        .ok_or(AvailabilityError::VehicleNotFound)?;
    let availability = day_availability(store, vehicle.id, date).await?;

    Ok(VehicleDay { vehicle, availability })
}

/// Slot availability for a vehicle already known to exist.
///
/// A blocked date short-circuits before any booking lookup.
pub async fn day_availability<S>(store: &S, vehicle_id: Uuid, date: NaiveDate) -> Result<DayAvailability, StoreError>
where
    S: BlockedDateStore + BookingStore + ?Sized,
{
    let mut day_slots = generate_slots(date);

    if store.is_blocked(vehicle_id, date).await? {
        slots::block_all(&mut day_slots);
        return Ok(DayAvailability {
            vehicle_id,
            date,
            is_blocked: true,
            slots: day_slots,
        });
    }

    let occupied: Vec<_> = store
        .active_bookings_on(vehicle_id, date)
        .await?
        .iter()
        .filter_map(|booking| slots::occupied_range_on(booking, date))
        .collect();
    slots::apply_occupied(&mut day_slots, &occupied);

    Ok(DayAvailability {
        vehicle_id,
        date,
        is_blocked: false,
        slots: day_slots,
    })
}

/// Return dates for a pickup, plus the valid return times on `return_date`.
pub async fn return_options<S>(
    store: &S,
    vehicle: &Vehicle,
    pickup: NaiveDateTime,
    return_date: Option<NaiveDate>,
) -> Result<ReturnOptions, StoreError>
where
    S: BlockedDateStore + BookingStore + ?Sized,
{
    let return_dates = return_date_options(pickup, vehicle.minimum_hours, vehicle.maximum_hours);

    let return_slots = match return_date {
        Some(date) => {
            let day = day_availability(store, vehicle.id, date).await?;
            let free_until = next_conflict(store, vehicle.id, pickup, date).await?;
            Some(filter_return_slots(
                pickup,
                &day.slots,
                vehicle.minimum_hours,
                vehicle.maximum_hours,
                free_until,
            ))
        }
        None => None,
    };

    Ok(ReturnOptions {
        vehicle_id: vehicle.id,
        return_dates,
        return_slots,
    })
}

/// First instant at or after `pickup` at which the vehicle is no longer free,
/// looking no further than `through`.
///
/// A blocked date conflicts from its midnight, a booking from its start.
async fn next_conflict<S>(
    store: &S,
    vehicle_id: Uuid,
    pickup: NaiveDateTime,
    through: NaiveDate,
) -> Result<Option<NaiveDateTime>, StoreError>
where
    S: BlockedDateStore + BookingStore + ?Sized,
{
    for date in pickup.date().iter_days().take_while(|d| *d <= through) {
        if store.is_blocked(vehicle_id, date).await? {
            return Ok(Some(date.and_time(NaiveTime::MIN).max(pickup)));
        }

        let earliest = store
            .active_bookings_on(vehicle_id, date)
            .await?
            .iter()
            .filter(|booking| booking.ends_at() > pickup)
            .map(|booking| booking.starts_at().max(pickup))
            .min();

        if earliest.is_some() {
            return Ok(earliest);
        }
    }

    Ok(None)
}

/// Why a requested range cannot be booked
#[derive(Debug, Clone, PartialEq)]
pub enum RangeConflict {
    Blocked(NaiveDate),
    Booked { booking_id: Uuid },
}

/// Check `[start, end)` against blocked dates and active bookings on every
/// date it touches.
pub async fn check_range<S>(
    store: &S,
    vehicle_id: Uuid,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Option<RangeConflict>, StoreError>
where
    S: BlockedDateStore + BookingStore + ?Sized,
{
    for date in start.date().iter_days().take_while(|d| *d <= end.date()) {
        // A range ending exactly at midnight does not touch the next date
        if date == end.date() && date != start.date() && end.time() == NaiveTime::MIN {
            break;
        }

        if store.is_blocked(vehicle_id, date).await? {
            return Ok(Some(RangeConflict::Blocked(date)));
        }

        let clash = store
            .active_bookings_on(vehicle_id, date)
            .await?
            .into_iter()
            .find(|booking| start < booking.ends_at() && end > booking.starts_at());

        if let Some(booking) = clash {
            return Ok(Some(RangeConflict::Booked {
                booking_id: booking.id,
            }));
        }
    }

    Ok(None)
}
