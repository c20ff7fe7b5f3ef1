//! Admin route handlers
//!
//! Everything except login sits behind `require_admin`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::{self, AdminToken, SessionStore};
use crate::booking::BookingLifecycle;
use crate::db::{find_vehicle, BlockedDateStore, BookingStore, CatalogStore, SettingsStore, Store, StoreError};
use crate::error::{AppError, Result};
use crate::models::{
    parse_iso_date, BlockedDate, BlockedDateListing, BookingListing, NewBlockedDate, PricingUpdate,
    FUEL_CHARGE_ENABLED,
};
use crate::notifications::Notifier;
use crate::payments::PaymentGateway;
use crate::pricing::requests::PricingUpdateRequest;
use crate::pricing::responses::VehiclePricingResponse;
use crate::state::AppState;

use super::JsonBody;

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub password: Option<String>,
}

/// Exchange the shared admin password for a bearer token
pub async fn login(State(state): State<AppState>, JsonBody(request): JsonBody<LoginRequest>) -> Result<Json<Value>> {
    let expected = state
        .settings
        .admin_password
        .as_deref()
        .ok_or_else(|| AppError::Internal("ADMIN_PASSWORD is not configured".to_string()))?;

    let candidate = request.password.unwrap_or_default();
    if !auth::password_matches(&candidate, expected) {
        info!("Rejected admin login");
        return Err(AppError::Unauthorized);
    }

    let token = auth::issue_token(state.sessions.as_ref()).await;
    info!("Admin session issued");

    Ok(Json(json!({ "token": token })))
}

/// Token check; the middleware has already validated it
pub async fn check() -> Json<Value> {
    Json(json!({ "valid": true }))
}

pub async fn logout(State(state): State<AppState>, Extension(AdminToken(token)): Extension<AdminToken>) -> Json<Value> {
    state.sessions.invalidate(&token).await;
    info!("Admin session closed");
    success()
}

pub async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<BookingListing>>> {
    Ok(Json(state.store.list_bookings().await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingActionRequest {
    pub booking_id: Option<String>,
    pub reason: Option<String>,
}

impl BookingActionRequest {
    fn booking_id(&self) -> Result<Uuid> {
        let raw = trimmed(&self.booking_id).ok_or_else(|| AppError::Validation("Missing bookingId".to_string()))?;
        // Ids that cannot exist are reported like unknown ones
        Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Booking not found".to_string()))
    }
}

/// Capture the hold and confirm
pub async fn approve_booking(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<BookingActionRequest>,
) -> Result<Json<Value>> {
    let id = request.booking_id()?;
    let booking = lifecycle(&state).approve(id).await?;

    Ok(Json(json!({ "success": true, "booking": booking })))
}

/// Release the hold and cancel, with an optional reason for the customer
pub async fn reject_booking(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<BookingActionRequest>,
) -> Result<Json<Value>> {
    let id = request.booking_id()?;
    let booking = lifecycle(&state).reject(id, trimmed(&request.reason)).await?;

    Ok(Json(json!({ "success": true, "booking": booking })))
}

fn lifecycle(state: &AppState) -> BookingLifecycle<'_, dyn Store, dyn PaymentGateway, dyn Notifier> {
    BookingLifecycle::new(
        state.store.as_ref(),
        state.payments.as_ref(),
        state.notifier.as_ref(),
        &state.settings.mail,
    )
}

pub async fn list_blocked(State(state): State<AppState>) -> Result<Json<Vec<BlockedDateListing>>> {
    Ok(Json(state.store.list_blocked().await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDateRequest {
    pub vehicle_id: Option<String>,
    pub date: Option<String>,
    pub reason: Option<String>,
}

/// Block a whole day for one vehicle
pub async fn create_blocked(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<BlockDateRequest>,
) -> Result<(StatusCode, Json<BlockedDate>)> {
    let (Some(vehicle_key), Some(raw_date)) = (trimmed(&request.vehicle_id), trimmed(&request.date)) else {
        return Err(AppError::Validation("Missing required fields".to_string()));
    };
    let date = parse_iso_date(raw_date).ok_or_else(|| AppError::Validation("Invalid date".to_string()))?;

    let vehicle = find_vehicle(state.store.as_ref(), vehicle_key)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let blocked = state
        .store
        .create_blocked(&NewBlockedDate {
            vehicle_id: vehicle.id,
            date,
            reason: trimmed(&request.reason).map(str::to_string),
        })
        .await
        .map_err(|e| match e {
            StoreError::AlreadyExists => AppError::Conflict("Date is already blocked".to_string()),
            StoreError::InvalidReference => AppError::NotFound("Vehicle not found".to_string()),
            other => AppError::Database(other),
        })?;

    info!("Blocked {} for {}", blocked.date, vehicle.name);

    Ok((StatusCode::CREATED, Json(blocked)))
}

#[derive(Debug, Default, Deserialize)]
pub struct BlockedIdParams {
    pub id: Option<String>,
}

/// Remove a blocked date, by `?id=` or a JSON body
pub async fn delete_blocked(
    State(state): State<AppState>,
    Query(query): Query<BlockedIdParams>,
    body: Option<Json<BlockedIdParams>>,
) -> Result<Json<Value>> {
    let raw = trimmed(&query.id)
        .map(str::to_string)
        .or_else(|| body.and_then(|Json(body)| trimmed(&body.id).map(str::to_string)))
        .ok_or_else(|| AppError::Validation("Missing id".to_string()))?;
    let not_found = || AppError::NotFound("Blocked date not found".to_string());
    let id = Uuid::parse_str(&raw).map_err(|_| not_found())?;

    if !state.store.delete_blocked(id).await? {
        return Err(not_found());
    }

    info!("Blocked date {} removed", id);
    Ok(success())
}

/// Pricing table read straight from the store
pub async fn list_pricing(State(state): State<AppState>) -> Result<Json<Vec<VehiclePricingResponse>>> {
    let vehicles = state.store.list_vehicles(None).await?;
    Ok(Json(vehicles.iter().map(VehiclePricingResponse::from).collect()))
}

/// Update the pricing fields of one vehicle and drop cached catalog entries
pub async fn update_pricing(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PricingUpdateRequest>,
) -> Result<Json<Value>> {
    let (Some(vehicle_key), Some(price_per_hour), Some(minimum_hours), Some(maximum_hours), Some(fuel_charge_percent)) = (
        trimmed(&request.vehicle_id),
        request.price_per_hour,
        request.minimum_hours,
        request.maximum_hours,
        request.fuel_charge_percent,
    ) else {
        return Err(AppError::Validation("Missing required fields".to_string()));
    };

    let update = PricingUpdate {
        price_per_hour,
        minimum_hours,
        maximum_hours,
        fuel_charge_percent,
    };
    update.validate().map_err(AppError::Validation)?;

    let vehicle = find_vehicle(state.store.as_ref(), vehicle_key)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if !state.store.update_pricing(vehicle.id, &update).await? {
        return Err(AppError::NotFound("Vehicle not found".to_string()));
    }
    state.cache.invalidate_all();

    info!(
        "Pricing for {} set to {}/h, {}-{} hours, {}% fuel",
        vehicle.name, update.price_per_hour, update.minimum_hours, update.maximum_hours, update.fuel_charge_percent
    );
    Ok(success())
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingRequest {
    pub key: Option<String>,
    pub value: Option<Value>,
}

/// Upsert one site setting. Booleans are stored as `"true"`/`"false"`.
pub async fn put_setting(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SettingRequest>,
) -> Result<Json<Value>> {
    let key = trimmed(&request.key).ok_or_else(|| AppError::Validation("Missing key".to_string()))?;
    let value = match request.value {
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => return Err(AppError::Validation("Missing value".to_string())),
    };

    if key == FUEL_CHARGE_ENABLED && value != "true" && value != "false" {
        return Err(AppError::Validation(format!("{} must be true or false", FUEL_CHARGE_ENABLED)));
    }

    state.store.put_setting(key, &value).await?;
    info!("Setting {} = {}", key, value);

    Ok(success())
}
