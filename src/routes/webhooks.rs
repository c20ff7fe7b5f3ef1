//! Payment provider webhook
//!
//! The raw body is needed for signature verification, so it is taken as
//! bytes and decoded by the gateway.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::booking::{BookingError, BookingLifecycle};
use crate::error::{AppError, Result};
use crate::payments::{PaymentError, PaymentEvent};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

fn received() -> Json<Value> {
    Json(json!({ "received": true }))
}

/// Verify and apply a payment event.
///
/// Events that verify but cannot become a booking are acknowledged so the
/// provider stops retrying them.
pub async fn stripe(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Validation("Missing signature".to_string()))?;

    let event = state.payments.decode_event(&body, signature).map_err(|e| match e {
        PaymentError::InvalidSignature => {
            warn!("Rejected webhook with invalid signature");
            AppError::Validation("Invalid signature".to_string())
        }
        PaymentError::MalformedEvent(msg) => AppError::Validation(format!("Malformed event: {}", msg)),
        other => AppError::Upstream(other),
    })?;

    let lifecycle = BookingLifecycle::new(
        state.store.as_ref(),
        state.payments.as_ref(),
        state.notifier.as_ref(),
        &state.settings.mail,
    );

    match event {
        PaymentEvent::Authorized(session) => match lifecycle.record_authorization(&session).await {
            Ok(_) => {}
            Err(BookingError::InvalidEvent(msg)) => {
                warn!("Ignoring checkout session {}: {}", session.session_id, msg);
            }
            Err(e) => return Err(e.into()),
        },
        PaymentEvent::Expired { session_id } => lifecycle.record_expiry(&session_id).await?,
        PaymentEvent::Other { kind } => debug!("Ignoring {} event", kind),
    }

    Ok(received())
}
