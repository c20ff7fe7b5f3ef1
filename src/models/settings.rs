//! Site settings

use serde::Serialize;
use sqlx::FromRow;

/// Key of the global fuel-charge toggle
pub const FUEL_CHARGE_ENABLED: &str = "fuel_charge_enabled";

/// Row from `site_settings`
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct SiteSetting {
    pub key: String,
    pub value: String,
}

impl SiteSetting {
    /// Public JSON form: `"true"`/`"false"` become booleans.
    pub fn json_value(&self) -> serde_json::Value {
        match self.value.as_str() {
            "true" => serde_json::Value::Bool(true),
            "false" => serde_json::Value::Bool(false),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

/// The fuel toggle is on unless explicitly stored as `false`.
pub fn fuel_charge_enabled(value: Option<&str>) -> bool {
    value != Some("false")
}
