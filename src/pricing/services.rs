//! Checkout service with database and payment provider access.
//!
//! Re-derives the price from the stored vehicle and the fuel toggle, checks
//! the range is still free, then opens a manual-capture hold.

use chrono::NaiveDateTime;
use tracing::info;

use crate::availability::{self, RangeConflict};
use crate::db::{find_vehicle, BlockedDateStore, BookingStore, CatalogStore, SettingsStore, StoreError};
use crate::models::{hhmm, parse_iso_date, settings, Vehicle, FUEL_CHARGE_ENABLED};
use crate::payments::{BookingMetadata, HoldRequest, PaymentError, PaymentGateway};

use super::calculators::{quote, rental_hours, validate_duration, DurationError, PriceQuote};
use super::requests::CheckoutRequest;
use super::responses::CheckoutResponse;

/// Checkout error types
#[derive(Debug)]
pub enum CheckoutError {
    MissingFields,
    Invalid(String),
    VehicleNotFound,
    TooManyGuests { capacity: i32 },
    Duration(DurationError),
    Unavailable,
    Store(StoreError),
    Payment(PaymentError),
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutError::MissingFields => write!(f, "Missing required fields"),
            CheckoutError::Invalid(message) => write!(f, "{}", message),
            CheckoutError::VehicleNotFound => write!(f, "Vehicle not found"),
            CheckoutError::TooManyGuests { capacity } => {
                write!(f, "This vehicle holds at most {} guests", capacity)
            }
            CheckoutError::Duration(e) => write!(f, "{}", e),
            CheckoutError::Unavailable => write!(f, "The selected time is no longer available"),
            CheckoutError::Store(e) => write!(f, "{}", e),
            CheckoutError::Payment(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CheckoutError {}

impl From<StoreError> for CheckoutError {
    fn from(error: StoreError) -> Self {
        CheckoutError::Store(error)
    }
}

impl From<PaymentError> for CheckoutError {
    fn from(error: PaymentError) -> Self {
        CheckoutError::Payment(error)
    }
}

/// Checkout request after field validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCheckout {
    pub vehicle_key: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub guest_count: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub notes: String,
}

impl ValidatedCheckout {
    /// Metadata the provider echoes back in the authorization event
    pub fn metadata(&self, vehicle: &Vehicle) -> BookingMetadata {
        BookingMetadata {
            vehicle_id: vehicle.id.to_string(),
            date: self.start.date().format("%Y-%m-%d").to_string(),
            start_time: self.start.time().format(hhmm::FORMAT).to_string(),
            end_time: self.end.time().format(hhmm::FORMAT).to_string(),
            end_date: self.end.date().format("%Y-%m-%d").to_string(),
            guest_count: self.guest_count.to_string(),
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            customer_phone: self.customer_phone.clone(),
            notes: self.notes.clone(),
        }
    }
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Check presence and format of every checkout field.
pub fn validate_request(request: &CheckoutRequest) -> Result<ValidatedCheckout, CheckoutError> {
    let (
        Some(vehicle_key),
        Some(date),
        Some(start_time),
        Some(end_time),
        Some(guest_count),
        Some(customer_name),
        Some(customer_email),
        Some(customer_phone),
    ) = (
        required(&request.vehicle_id),
        required(&request.date),
        required(&request.start_time),
        required(&request.end_time),
        request.guest_count,
        required(&request.customer_name),
        required(&request.customer_email),
        required(&request.customer_phone),
    )
    else {
        return Err(CheckoutError::MissingFields);
    };

    if guest_count <= 0 {
        return Err(CheckoutError::Invalid("Guest count must be at least 1".to_string()));
    }

    let date = parse_iso_date(&date).ok_or_else(|| CheckoutError::Invalid("Invalid date".to_string()))?;
    let end_date = match required(&request.end_date) {
        Some(raw) => parse_iso_date(&raw).ok_or_else(|| CheckoutError::Invalid("Invalid end date".to_string()))?,
        None => date,
    };
    let start_time =
        hhmm::parse(&start_time).ok_or_else(|| CheckoutError::Invalid("Invalid start time".to_string()))?;
    let end_time = hhmm::parse(&end_time).ok_or_else(|| CheckoutError::Invalid("Invalid end time".to_string()))?;

    if !customer_email.contains('@') {
        return Err(CheckoutError::Invalid("Invalid email address".to_string()));
    }

    Ok(ValidatedCheckout {
        vehicle_key,
        start: date.and_time(start_time),
        end: end_date.and_time(end_time),
        guest_count,
        customer_name,
        customer_email,
        customer_phone,
        notes: request.notes.as_deref().unwrap_or_default().trim().to_string(),
    })
}

/// Price a validated rental of `vehicle`, enforcing its hour bounds.
pub fn price_rental(
    checkout: &ValidatedCheckout,
    vehicle: &Vehicle,
    fuel_enabled: bool,
) -> Result<PriceQuote, CheckoutError> {
    if checkout.guest_count > vehicle.capacity {
        return Err(CheckoutError::TooManyGuests {
            capacity: vehicle.capacity,
        });
    }

    let hours = rental_hours(checkout.start, checkout.end);
    validate_duration(hours, vehicle.minimum_hours, vehicle.maximum_hours).map_err(CheckoutError::Duration)?;

    Ok(quote(
        hours,
        vehicle.price_per_hour,
        vehicle.fuel_charge_percent,
        fuel_enabled,
    ))
}

/// Validate, price and open a payment hold for a rental request.
///
/// Nothing is persisted; the booking is created later from the
/// authorization event.
pub async fn create_checkout<S, P>(
    store: &S,
    payments: &P,
    currency: &str,
    request: &CheckoutRequest,
) -> Result<CheckoutResponse, CheckoutError>
where
    S: CatalogStore + BlockedDateStore + BookingStore + SettingsStore + ?Sized,
    P: PaymentGateway + ?Sized,
{
    let checkout = validate_request(request)?;

    let vehicle = find_vehicle(store, &checkout.vehicle_key)
        .await?
        .ok_or(CheckoutError::VehicleNotFound)?;

    let fuel_enabled = settings::fuel_charge_enabled(store.setting(FUEL_CHARGE_ENABLED).await?.as_deref());
    let price = price_rental(&checkout, &vehicle, fuel_enabled)?;

    match availability::check_range(store, vehicle.id, checkout.start, checkout.end).await? {
        None => {}
        Some(RangeConflict::Blocked(date)) => {
            info!("Checkout refused: {} is blocked on {}", vehicle.slug, date);
            return Err(CheckoutError::Unavailable);
        }
        Some(RangeConflict::Booked { booking_id }) => {
            info!("Checkout refused: {} overlaps booking {}", vehicle.slug, booking_id);
            return Err(CheckoutError::Unavailable);
        }
    }

    let amount_cents = price
        .total_cents()
        .ok_or_else(|| CheckoutError::Invalid("Price is out of range".to_string()))?;

    let hold = payments
        .create_hold(&HoldRequest {
            product_name: vehicle.name.clone(),
            amount_cents,
            currency: currency.to_string(),
            customer_email: checkout.customer_email.clone(),
            metadata: checkout.metadata(&vehicle),
        })
        .await?;

    info!(
        "Checkout session {} opened for {} ({} hours, {} cents)",
        hold.session_id, vehicle.slug, price.hours, amount_cents
    );

    Ok(CheckoutResponse {
        url: hold.url,
        session_id: hold.session_id,
    })
}
