//! Rental vehicle catalog models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Boat,
    Bus,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Boat => "boat",
            VehicleCategory::Bus => "bus",
        }
    }
}

impl std::str::FromStr for VehicleCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boat" => Ok(VehicleCategory::Boat),
            "bus" => Ok(VehicleCategory::Bus),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

impl TryFrom<String> for VehicleCategory {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown vehicle category '{0}'")]
pub struct UnknownCategory(pub String);

/// Vehicle from the `vehicles` table
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[sqlx(try_from = "String")]
    pub category: VehicleCategory,
    pub description: String,
    pub capacity: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_hour: Decimal,
    pub minimum_hours: i32,
    pub maximum_hours: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub fuel_charge_percent: Decimal,
    #[sqlx(json)]
    pub features: Vec<String>,
    #[sqlx(json)]
    pub images: Vec<String>,
}

/// Admin edit of the pricing fields of a vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct PricingUpdate {
    pub price_per_hour: Decimal,
    pub minimum_hours: i32,
    pub maximum_hours: i32,
    pub fuel_charge_percent: Decimal,
}

impl PricingUpdate {
    /// Check the bounds an admin edit must respect.
    pub fn validate(&self) -> Result<(), String> {
        if self.price_per_hour < Decimal::ZERO {
            return Err("Price per hour cannot be negative".to_string());
        }
        if self.minimum_hours <= 0 {
            return Err("Minimum hours must be positive".to_string());
        }
        if self.maximum_hours < self.minimum_hours {
            return Err("Maximum hours cannot be less than minimum hours".to_string());
        }
        if self.fuel_charge_percent < Decimal::ZERO {
            return Err("Fuel charge percent cannot be negative".to_string());
        }
        Ok(())
    }
}
