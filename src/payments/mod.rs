//! Payment authorization port.
//!
//! Bookings are paid through a manual-capture hold: checkout creates the
//! hold, the provider reports the authorization through a signed event, and
//! an admin later captures or releases it.

pub mod stripe;

use std::collections::HashMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use stripe::{StripeClient, StripeConfig};

/// Booking request carried through the provider as session metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingMetadata {
    pub vehicle_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub end_date: String,
    pub guest_count: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub notes: String,
}

impl BookingMetadata {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vehicleId", self.vehicle_id.clone()),
            ("date", self.date.clone()),
            ("startTime", self.start_time.clone()),
            ("endTime", self.end_time.clone()),
            ("endDate", self.end_date.clone()),
            ("guestCount", self.guest_count.clone()),
            ("customerName", self.customer_name.clone()),
            ("customerEmail", self.customer_email.clone()),
            ("customerPhone", self.customer_phone.clone()),
            ("notes", self.notes.clone()),
        ]
    }

    /// Missing keys come back empty; validation happens at booking creation.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned().unwrap_or_default();
        Self {
            vehicle_id: get("vehicleId"),
            date: get("date"),
            start_time: get("startTime"),
            end_time: get("endTime"),
            end_date: get("endDate"),
            guest_count: get("guestCount"),
            customer_name: get("customerName"),
            customer_email: get("customerEmail"),
            customer_phone: get("customerPhone"),
            notes: get("notes"),
        }
    }
}

/// Request for a manual-capture checkout session
#[derive(Debug, Clone, PartialEq)]
pub struct HoldRequest {
    pub product_name: String,
    pub amount_cents: i64,
    pub currency: String,
    pub customer_email: String,
    pub metadata: BookingMetadata,
}

/// Created checkout session
#[derive(Debug, Clone, PartialEq)]
pub struct HoldSession {
    pub session_id: String,
    pub url: String,
}

/// Checkout session whose payment was authorized
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedSession {
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    pub amount_total: Option<i64>,
    pub customer_email: Option<String>,
    pub metadata: BookingMetadata,
}

/// Verified provider event
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    Authorized(AuthorizedSession),
    Expired { session_id: String },
    Other { kind: String },
}

/// Payment provider error types
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("invalid event signature")]
    InvalidSignature,

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("booking has no payment authorization reference")]
    MissingReference,

    #[error("payment provider rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("payment provider unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// Hosted payment provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a manual-capture hold and return where to send the customer.
    async fn create_hold(&self, request: &HoldRequest) -> Result<HoldSession, PaymentError>;

    /// Verify the signature of a raw event payload, then decode it.
    fn decode_event(&self, payload: &[u8], signature: &str) -> Result<PaymentEvent, PaymentError>;

    /// Capture a held authorization.
    async fn capture(&self, payment_ref: &str) -> Result<(), PaymentError>;

    /// Release a held authorization without charging.
    async fn release(&self, payment_ref: &str) -> Result<(), PaymentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_survives_provider_map() {
        let metadata = BookingMetadata {
            vehicle_id: "0b7c5a52-4f0e-4f7e-9d8e-1c1d2e3f4a5b".to_string(),
            date: "2026-07-04".to_string(),
            start_time: "13:00".to_string(),
            end_time: "16:00".to_string(),
            end_date: "2026-07-04".to_string(),
            guest_count: "12".to_string(),
            customer_name: "Pat Doe".to_string(),
            customer_email: "pat@example.com".to_string(),
            customer_phone: "555-0100".to_string(),
            notes: String::new(),
        };

        let map: HashMap<String, String> = metadata
            .to_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        assert_eq!(BookingMetadata::from_map(&map), metadata);
    }

    #[test]
    fn test_metadata_missing_keys_are_empty() {
        let metadata = BookingMetadata::from_map(&HashMap::new());
        assert!(metadata.vehicle_id.is_empty());
        assert!(metadata.notes.is_empty());
    }
}
