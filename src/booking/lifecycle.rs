//! Booking status machine synchronized with the payment hold.
//!
//! `pending_approval` is created from a verified authorization and resolved
//! once, to `confirmed` (capture) or `cancelled` (release). The payment call
//! always happens before the status write, and the write is a
//! compare-and-set, so a failed capture leaves the booking untouched and a
//! racing admin action ends in a conflict.

use chrono::NaiveDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{find_vehicle, BookingStore, CatalogStore};
use crate::models::{hhmm, parse_iso_date, Booking, BookingStatus, InsertOutcome, NewBooking};
use crate::notifications::templates::{self, BookingDetails};
use crate::notifications::{send_best_effort, MailConfig, Notifier};
use crate::payments::{AuthorizedSession, PaymentError, PaymentGateway};

use super::BookingError;

/// Result of recording an authorization
#[derive(Debug, Clone)]
pub enum Recorded {
    Created(Booking),
    /// The checkout session already produced a booking
    Duplicate,
}

/// Booking lifecycle over borrowed ports
pub struct BookingLifecycle<'a, S: ?Sized, P: ?Sized, N: ?Sized> {
    store: &'a S,
    payments: &'a P,
    notifier: &'a N,
    mail: &'a MailConfig,
}

impl<'a, S, P, N> BookingLifecycle<'a, S, P, N>
where
    S: CatalogStore + BookingStore + ?Sized,
    P: PaymentGateway + ?Sized,
    N: Notifier + ?Sized,
{
    pub fn new(store: &'a S, payments: &'a P, notifier: &'a N, mail: &'a MailConfig) -> Self {
        Self {
            store,
            payments,
            notifier,
            mail,
        }
    }

    /// Create a `pending_approval` booking from an authorized checkout session.
    ///
    /// Replays of the same session are a no-op.
    pub async fn record_authorization(&self, session: &AuthorizedSession) -> Result<Recorded, BookingError> {
        let request = parse_authorization(session).map_err(BookingError::InvalidEvent)?;

        let vehicle = find_vehicle(self.store, &session.metadata.vehicle_id)
            .await?
            .ok_or_else(|| {
                BookingError::InvalidEvent(format!("unknown vehicle '{}'", session.metadata.vehicle_id))
            })?;

        let new_booking = request.into_booking(vehicle.id, session);

        let booking = match self.store.insert_booking(&new_booking).await? {
            InsertOutcome::Created(booking) => booking,
            InsertOutcome::Duplicate => {
                info!("Checkout session {} already recorded", session.session_id);
                return Ok(Recorded::Duplicate);
            }
        };

        info!(
            "Booking {} created for {} on {} (session {})",
            booking.id, vehicle.name, booking.date, booking.checkout_session_id
        );

        let details = BookingDetails::new(&booking, &vehicle.name);
        send_best_effort(
            self.notifier,
            templates::request_received(self.mail, &details),
            "booking request",
        )
        .await;
        send_best_effort(
            self.notifier,
            templates::staff_booking_notice(self.mail, &details),
            "staff booking notice",
        )
        .await;

        Ok(Recorded::Created(booking))
    }

    /// Capture the hold and confirm the booking.
    pub async fn approve(&self, id: Uuid) -> Result<Booking, BookingError> {
        let booking = self.pending(id).await?;
        let payment_ref = booking
            .payment_intent_id
            .as_deref()
            .ok_or(PaymentError::MissingReference)?;

        self.payments.capture(payment_ref).await?;

        let confirmed = self.transition(booking, BookingStatus::Confirmed).await?;
        info!("Booking {} confirmed", confirmed.id);

        let details = self.details(&confirmed).await;
        send_best_effort(
            self.notifier,
            templates::booking_confirmed(self.mail, &details),
            "booking confirmation",
        )
        .await;

        Ok(confirmed)
    }

    /// Release the hold and cancel the booking.
    pub async fn reject(&self, id: Uuid, reason: Option<&str>) -> Result<Booking, BookingError> {
        let booking = self.pending(id).await?;
        let payment_ref = booking
            .payment_intent_id
            .as_deref()
            .ok_or(PaymentError::MissingReference)?;

        self.payments.release(payment_ref).await?;

        let cancelled = self.transition(booking, BookingStatus::Cancelled).await?;
        info!("Booking {} rejected", cancelled.id);

        let details = self.details(&cancelled).await;
        send_best_effort(
            self.notifier,
            templates::booking_rejected(self.mail, &details, reason),
            "booking rejection",
        )
        .await;

        Ok(cancelled)
    }

    /// A checkout session expired without payment. Nothing changes.
    pub async fn record_expiry(&self, session_id: &str) -> Result<(), BookingError> {
        match self.store.booking_by_session(session_id).await? {
            Some(booking) => info!(
                "Checkout session {} expired but booking {} exists; ignoring",
                session_id, booking.id
            ),
            None => info!("Checkout session {} expired", session_id),
        }
        Ok(())
    }

    async fn pending(&self, id: Uuid) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .booking_by_id(id)
            .await?
            .ok_or(BookingError::NotFound)?;

        if booking.status != BookingStatus::PendingApproval {
            return Err(BookingError::NotPending);
        }
        Ok(booking)
    }

    async fn transition(&self, booking: Booking, to: BookingStatus) -> Result<Booking, BookingError> {
        if !self.store.transition_status(booking.id, booking.status, to).await? {
            warn!(
                "Booking {} changed state before it could move to {}",
                booking.id, to
            );
            return Err(BookingError::NotPending);
        }
        Ok(Booking { status: to, ..booking })
    }

    async fn details(&self, booking: &Booking) -> BookingDetails {
        let vehicle_name = match self.store.vehicle_by_id(booking.vehicle_id).await {
            Ok(Some(vehicle)) => vehicle.name,
            Ok(None) => "your vehicle".to_string(),
            Err(e) => {
                warn!("Failed to load vehicle for booking {}: {}", booking.id, e);
                "your vehicle".to_string()
            }
        };
        BookingDetails::new(booking, &vehicle_name)
    }
}

/// Booking fields parsed out of session metadata
#[derive(Debug, Clone, PartialEq)]
struct AuthorizedRequest {
    date: chrono::NaiveDate,
    start: NaiveDateTime,
    end: NaiveDateTime,
    guest_count: i32,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    notes: Option<String>,
}

impl AuthorizedRequest {
    fn into_booking(self, vehicle_id: Uuid, session: &AuthorizedSession) -> NewBooking {
        let end_date = self.end.date();
        NewBooking {
            vehicle_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            date: self.date,
            start_time: self.start.time(),
            end_time: self.end.time(),
            end_date: (end_date != self.date).then_some(end_date),
            guest_count: self.guest_count,
            notes: self.notes,
            total_price: session.amount_total.unwrap_or(0),
            checkout_session_id: session.session_id.clone(),
            payment_intent_id: session.payment_intent_id.clone(),
        }
    }
}

fn parse_authorization(session: &AuthorizedSession) -> Result<AuthorizedRequest, String> {
    let metadata = &session.metadata;
    let customer_email = if metadata.customer_email.trim().is_empty() {
        session.customer_email.clone().unwrap_or_default()
    } else {
        metadata.customer_email.clone()
    };

    let required = [
        &metadata.vehicle_id,
        &metadata.date,
        &metadata.start_time,
        &metadata.end_time,
        &metadata.customer_name,
        &customer_email,
        &metadata.customer_phone,
    ];
    if required.iter().any(|value| value.trim().is_empty()) {
        return Err("missing required fields".to_string());
    }

    let guest_count: i32 = metadata.guest_count.trim().parse().unwrap_or(0);
    if guest_count <= 0 {
        return Err(format!("invalid guest count '{}'", metadata.guest_count));
    }

    let date = parse_iso_date(&metadata.date).ok_or_else(|| format!("invalid date '{}'", metadata.date))?;
    let end_date = if metadata.end_date.trim().is_empty() {
        date
    } else {
        parse_iso_date(&metadata.end_date).ok_or_else(|| format!("invalid end date '{}'", metadata.end_date))?
    };
    let start_time = hhmm::parse(&metadata.start_time)
        .ok_or_else(|| format!("invalid start time '{}'", metadata.start_time))?;
    let end_time = hhmm::parse(&metadata.end_time)
        .ok_or_else(|| format!("invalid end time '{}'", metadata.end_time))?;

    let start = date.and_time(start_time);
    let end = end_date.and_time(end_time);
    if end <= start {
        return Err("rental ends before it starts".to_string());
    }

    let notes = Some(metadata.notes.trim().to_string()).filter(|n| !n.is_empty());

    Ok(AuthorizedRequest {
        date,
        start,
        end,
        guest_count,
        customer_name: metadata.customer_name.trim().to_string(),
        customer_email: customer_email.trim().to_string(),
        customer_phone: metadata.customer_phone.trim().to_string(),
        notes,
    })
}
