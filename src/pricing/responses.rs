//! Response DTOs for checkout and pricing endpoints.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::Vehicle;

/// Response of `POST /api/checkout`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Hosted payment page to redirect the customer to
    pub url: String,
    pub session_id: String,
}

/// Pricing fields of one vehicle, for the admin pricing table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePricingResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_hour: Decimal,
    pub minimum_hours: i32,
    pub maximum_hours: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub fuel_charge_percent: Decimal,
}

impl From<&Vehicle> for VehiclePricingResponse {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            name: vehicle.name.clone(),
            slug: vehicle.slug.clone(),
            price_per_hour: vehicle.price_per_hour,
            minimum_hours: vehicle.minimum_hours,
            maximum_hours: vehicle.maximum_hours,
            fuel_charge_percent: vehicle.fuel_charge_percent,
        }
    }
}
