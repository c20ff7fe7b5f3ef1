//! Stripe adapter: Checkout sessions with manual capture, PaymentIntent
//! capture/cancel, and webhook signature verification.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;

use super::{
    AuthorizedSession, BookingMetadata, HoldRequest, HoldSession, PaymentError, PaymentEvent,
    PaymentGateway,
};

type HmacSha256 = Hmac<Sha256>;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Maximum age of a signed webhook, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Configuration for the Stripe client
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    /// Public site URL used to build the success/cancel redirects
    pub public_base_url: String,
}

/// HTTP client for the Stripe API
#[derive(Debug, Clone)]
pub struct StripeClient {
    config: StripeConfig,
    http: Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn success_url(&self) -> String {
        format!(
            "{}/booking/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.config.public_base_url.trim_end_matches('/')
        )
    }

    fn cancel_url(&self) -> String {
        format!("{}/booking/cancel", self.config.public_base_url.trim_end_matches('/'))
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<reqwest::Response, PaymentError> {
        let response = self
            .http
            .post(format!("{}{}", API_BASE, path))
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error.message.unwrap_or_default(),
                Err(_) => String::new(),
            };
            return Err(PaymentError::Provider { status, message });
        }

        Ok(response)
    }
}

/// Form fields for a manual-capture checkout session
fn checkout_session_form(request: &HoldRequest, success_url: String, cancel_url: String) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("payment_intent_data[capture_method]".to_string(), "manual".to_string()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("line_items[0][price_data][currency]".to_string(), request.currency.clone()),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
        ("customer_email".to_string(), request.customer_email.clone()),
        ("success_url".to_string(), success_url),
        ("cancel_url".to_string(), cancel_url),
    ];

    form.extend(
        request
            .metadata
            .to_pairs()
            .into_iter()
            .map(|(key, value)| (format!("metadata[{}]", key), value)),
    );

    form
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_hold(&self, request: &HoldRequest) -> Result<HoldSession, PaymentError> {
        let form = checkout_session_form(request, self.success_url(), self.cancel_url());
        let response = self.post_form("/checkout/sessions", &form).await?;
        let session: CheckoutSessionBody = response.json().await?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::MalformedEvent("checkout session has no url".to_string()))?;

        Ok(HoldSession {
            session_id: session.id,
            url,
        })
    }

    fn decode_event(&self, payload: &[u8], signature: &str) -> Result<PaymentEvent, PaymentError> {
        verify_signature(
            payload,
            signature,
            &self.config.webhook_secret,
            Utc::now().timestamp(),
        )?;
        parse_event(payload)
    }

    async fn capture(&self, payment_ref: &str) -> Result<(), PaymentError> {
        if payment_ref.is_empty() {
            return Err(PaymentError::MissingReference);
        }
        self.post_form(&format!("/payment_intents/{}/capture", payment_ref), &[])
            .await?;
        Ok(())
    }

    async fn release(&self, payment_ref: &str) -> Result<(), PaymentError> {
        if payment_ref.is_empty() {
            return Err(PaymentError::MissingReference);
        }
        self.post_form(&format!("/payment_intents/{}/cancel", payment_ref), &[])
            .await?;
        Ok(())
    }
}

/// Check a `Stripe-Signature` header against the raw payload.
///
/// The header looks like `t=1700000000,v1=<hex>,v1=<hex>`; the signed
/// message is `"{t}.{payload}"`.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str, now: i64) -> Result<(), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(PaymentError::InvalidSignature)?;
    if signatures.is_empty() || (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::InvalidSignature);
    }

    let matches = signatures.iter().any(|candidate| {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(candidate).is_ok()
    });

    if matches {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature)
    }
}

/// Decode a verified event body.
pub fn parse_event(payload: &[u8]) -> Result<PaymentEvent, PaymentError> {
    let event: EventBody =
        serde_json::from_slice(payload).map_err(|e| PaymentError::MalformedEvent(e.to_string()))?;

    match event.kind.as_str() {
        "checkout.session.completed" => {
            let session: SessionObject = serde_json::from_value(event.data.object)
                .map_err(|e| PaymentError::MalformedEvent(e.to_string()))?;

            Ok(PaymentEvent::Authorized(AuthorizedSession {
                payment_intent_id: session.payment_intent_id(),
                session_id: session.id,
                amount_total: session.amount_total,
                customer_email: session.customer_details.and_then(|d| d.email),
                metadata: BookingMetadata::from_map(&session.metadata.unwrap_or_default()),
            }))
        }
        "checkout.session.expired" => {
            let session: SessionObject = serde_json::from_value(event.data.object)
                .map_err(|e| PaymentError::MalformedEvent(e.to_string()))?;
            Ok(PaymentEvent::Expired {
                session_id: session.id,
            })
        }
        _ => Ok(PaymentEvent::Other { kind: event.kind }),
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionBody {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventBody {
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    payment_intent: Option<serde_json::Value>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

impl SessionObject {
    /// `payment_intent` is an id string, or an object when expanded.
    fn payment_intent_id(&self) -> Option<String> {
        match self.payment_intent.as_ref()? {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Object(object) => object.get("id")?.as_str().map(str::to_string),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &[u8], timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{}.", timestamp).as_bytes());
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    fn completed_payload() -> Vec<u8> {
        serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "payment_intent": "pi_test_456",
                    "amount_total": 144000,
                    "customer_details": { "email": "pat@example.com" },
                    "metadata": {
                        "vehicleId": "v-1",
                        "date": "2026-07-04",
                        "startTime": "13:00",
                        "endTime": "16:00",
                        "guestCount": "12"
                    }
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    // ==================== verify_signature tests ====================

    #[test]
    fn test_valid_signature_passes() {
        let payload = completed_payload();
        let header = sign(&payload, 1_700_000_000);
        assert!(verify_signature(&payload, &header, SECRET, 1_700_000_010).is_ok());
    }

    #[test]
    fn test_tampered_payload_fails() {
        let payload = completed_payload();
        let header = sign(&payload, 1_700_000_000);
        let mut tampered = payload.clone();
        tampered.push(b' ');

        assert!(matches!(
            verify_signature(&tampered, &header, SECRET, 1_700_000_000),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let payload = completed_payload();
        let header = sign(&payload, 1_700_000_000);
        assert!(verify_signature(&payload, &header, "whsec_other", 1_700_000_000).is_err());
    }

    #[test]
    fn test_stale_signature_fails() {
        let payload = completed_payload();
        let header = sign(&payload, 1_700_000_000);
        let later = 1_700_000_000 + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(verify_signature(&payload, &header, SECRET, later).is_err());
    }

    #[test]
    fn test_any_matching_v1_is_accepted() {
        let payload = completed_payload();
        let valid = sign(&payload, 1_700_000_000);
        let header = format!("{},v1={}", valid, "00".repeat(32));
        assert!(verify_signature(&payload, &header, SECRET, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_garbage_header_fails() {
        let payload = completed_payload();
        assert!(verify_signature(&payload, "", SECRET, 0).is_err());
        assert!(verify_signature(&payload, "t=abc,v1=zz", SECRET, 0).is_err());
        assert!(verify_signature(&payload, "v1=00", SECRET, 0).is_err());
    }

    // ==================== parse_event tests ====================

    #[test]
    fn test_parse_completed_session() {
        let event = parse_event(&completed_payload()).unwrap();

        let PaymentEvent::Authorized(session) = event else {
            panic!("expected an authorized session, got {:?}", event);
        };
        assert_eq!(session.session_id, "cs_test_123");
        assert_eq!(session.payment_intent_id.as_deref(), Some("pi_test_456"));
        assert_eq!(session.amount_total, Some(144_000));
        assert_eq!(session.customer_email.as_deref(), Some("pat@example.com"));
        assert_eq!(session.metadata.start_time, "13:00");
        assert_eq!(session.metadata.guest_count, "12");
        assert!(session.metadata.customer_name.is_empty());
    }

    #[test]
    fn test_parse_expanded_payment_intent() {
        let payload = serde_json::json!({
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_1", "payment_intent": { "id": "pi_9" } } }
        })
        .to_string();

        let Ok(PaymentEvent::Authorized(session)) = parse_event(payload.as_bytes()) else {
            panic!("expected an authorized session");
        };
        assert_eq!(session.payment_intent_id.as_deref(), Some("pi_9"));
    }

    #[test]
    fn test_parse_expired_and_other_events() {
        let expired = serde_json::json!({
            "type": "checkout.session.expired",
            "data": { "object": { "id": "cs_gone" } }
        })
        .to_string();
        assert_eq!(
            parse_event(expired.as_bytes()).unwrap(),
            PaymentEvent::Expired {
                session_id: "cs_gone".to_string()
            }
        );

        let other = serde_json::json!({
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_1" } }
        })
        .to_string();
        assert_eq!(
            parse_event(other.as_bytes()).unwrap(),
            PaymentEvent::Other {
                kind: "charge.refunded".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_event(b"not json"),
            Err(PaymentError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_checkout_form_requests_manual_capture() {
        let request = HoldRequest {
            product_name: "50 Foot Carver Yacht".to_string(),
            amount_cents: 210_000,
            currency: "usd".to_string(),
            customer_email: "pat@example.com".to_string(),
            metadata: BookingMetadata {
                vehicle_id: "v-3".to_string(),
                ..Default::default()
            },
        };

        let form = checkout_session_form(&request, "https://s".to_string(), "https://c".to_string());
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("payment_intent_data[capture_method]"), Some("manual"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("210000"));
        assert_eq!(get("metadata[vehicleId]"), Some("v-3"));
        assert_eq!(get("success_url"), Some("https://s"));
    }

    #[tokio::test]
    async fn test_empty_reference_is_rejected_locally() {
        let client = StripeClient::new(StripeConfig {
            secret_key: "sk_test".to_string(),
            webhook_secret: SECRET.to_string(),
            public_base_url: "https://example.com".to_string(),
        });

        assert!(matches!(client.capture("").await, Err(PaymentError::MissingReference)));
        assert!(matches!(client.release("").await, Err(PaymentError::MissingReference)));
    }
}
