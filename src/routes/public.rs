//! Public route handlers: catalog, availability, checkout and contact

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::availability::{self, DayAvailability, ReturnOptions};
use crate::cache::CacheStats;
use crate::db::{find_vehicle, SettingsStore};
use crate::error::{AppError, Result};
use crate::models::{hhmm, parse_iso_date, Vehicle, VehicleCategory};
use crate::notifications::templates::{self, ContactMessage};
use crate::notifications::Notifier;
use crate::pricing::requests::CheckoutRequest;
use crate::pricing::responses::CheckoutResponse;
use crate::pricing::create_checkout;
use crate::state::AppState;

use super::JsonBody;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    cache: CacheStats,
}

/// Health check with cache statistics
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

/// Vehicle catalog, optionally narrowed to one category
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Vehicle>>> {
    let category = match query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => Some(
            raw.parse::<VehicleCategory>()
                .map_err(|_| AppError::Validation("Invalid category".to_string()))?,
        ),
        None => None,
    };

    let vehicles = state
        .cache
        .vehicle_listing(state.store.as_ref(), category)
        .await?;

    Ok(Json((*vehicles).clone()))
}

/// One vehicle by slug
pub async fn vehicle(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Vehicle>> {
    let vehicle = state
        .cache
        .vehicle(state.store.as_ref(), &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    Ok(Json((*vehicle).clone()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub vehicle_id: Option<String>,
    pub date: Option<String>,
    pub start: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    #[serde(flatten)]
    day: DayAvailability,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_options: Option<Vec<String>>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Hourly slots of a vehicle on a date, plus end-time choices when a start
/// time is given
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>> {
    let (Some(vehicle_key), Some(raw_date)) = (present(&query.vehicle_id), present(&query.date)) else {
        return Err(AppError::Validation(
            "Missing required query params: vehicleId and date".to_string(),
        ));
    };
    let date = parse_iso_date(raw_date).ok_or_else(|| AppError::Validation("Invalid date".to_string()))?;
    let start = match present(&query.start) {
        Some(raw) => Some(hhmm::parse(raw).ok_or_else(|| AppError::Validation("Invalid start time".to_string()))?),
        None => None,
    };

    let day = availability::get_availability(state.store.as_ref(), vehicle_key, date).await?;
    let end_options = start.map(|start| {
        day.end_options(start)
            .iter()
            .map(|t| t.format(hhmm::FORMAT).to_string())
            .collect()
    });

    Ok(Json(AvailabilityResponse {
        day: day.availability,
        end_options,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOptionsQuery {
    pub vehicle_id: Option<String>,
    pub date: Option<String>,
    pub start: Option<String>,
    pub return_date: Option<String>,
}

/// Return dates for a multi-day pickup, plus return times on `returnDate`
pub async fn return_options(
    State(state): State<AppState>,
    Query(query): Query<ReturnOptionsQuery>,
) -> Result<Json<ReturnOptions>> {
    let (Some(vehicle_key), Some(raw_date), Some(raw_start)) =
        (present(&query.vehicle_id), present(&query.date), present(&query.start))
    else {
        return Err(AppError::Validation(
            "Missing required query params: vehicleId, date and start".to_string(),
        ));
    };
    let date = parse_iso_date(raw_date).ok_or_else(|| AppError::Validation("Invalid date".to_string()))?;
    let start = hhmm::parse(raw_start).ok_or_else(|| AppError::Validation("Invalid start time".to_string()))?;
    let return_date = match present(&query.return_date) {
        Some(raw) => Some(parse_iso_date(raw).ok_or_else(|| AppError::Validation("Invalid return date".to_string()))?),
        None => None,
    };

    let vehicle = find_vehicle(state.store.as_ref(), vehicle_key)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let options =
        availability::return_options(state.store.as_ref(), &vehicle, date.and_time(start), return_date).await?;

    Ok(Json(options))
}

/// Public site settings with boolean values parsed
pub async fn settings(State(state): State<AppState>) -> Result<Json<Map<String, Value>>> {
    let settings = state.store.list_settings().await?;

    Ok(Json(
        settings
            .iter()
            .map(|setting| (setting.key.clone(), setting.json_value()))
            .collect(),
    ))
}

/// Validate, price and open a payment hold
pub async fn checkout(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let response = create_checkout(
        state.store.as_ref(),
        state.payments.as_ref(),
        &state.settings.currency,
        &request,
    )
    .await?;

    Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// Forward a contact form submission to the staff inbox
pub async fn contact(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ContactRequest>,
) -> Result<Json<Value>> {
    let (Some(name), Some(email), Some(message)) =
        (present(&request.name), present(&request.email), present(&request.message))
    else {
        return Err(AppError::Validation("Missing required fields".to_string()));
    };

    let message = ContactMessage {
        name: name.to_string(),
        email: email.to_string(),
        phone: present(&request.phone).unwrap_or_default().to_string(),
        message: message.to_string(),
    };

    let email = templates::contact_message(&state.settings.mail, &message)?;
    state.notifier.send(&email).await?;
    tracing::info!("Contact message from {} forwarded", message.email);

    Ok(Json(json!({ "success": true })))
}
