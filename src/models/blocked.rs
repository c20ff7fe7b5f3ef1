//! Blocked-date models

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Whole-day unavailability override for one vehicle
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDate {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

/// Blocked date joined with its vehicle name
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDateListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub blocked: BlockedDate,
    pub vehicle_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBlockedDate {
    pub vehicle_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
}
