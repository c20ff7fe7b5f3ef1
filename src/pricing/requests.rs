//! Request DTOs for checkout and pricing endpoints.
//!
//! Every field is optional so a missing one becomes a validation message
//! rather than a body-rejection.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Body of `POST /api/checkout`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Vehicle id, or its slug
    pub vehicle_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Return date of a multi-day rental; defaults to `date`
    pub end_date: Option<String>,
    pub guest_count: Option<i32>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Body of `POST /api/admin/pricing`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingUpdateRequest {
    pub vehicle_id: Option<String>,
    pub price_per_hour: Option<Decimal>,
    pub minimum_hours: Option<i32>,
    pub maximum_hours: Option<i32>,
    pub fuel_charge_percent: Option<Decimal>,
}
