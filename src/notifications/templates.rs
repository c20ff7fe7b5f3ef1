//! Plain-text email bodies rendered with askama

use askama::Template;

use crate::models::Booking;

use super::{Email, MailConfig, NotifyError};

/// Booking fields as they appear in emails
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub customer_name: String,
    pub first_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub vehicle_name: String,
    pub date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    /// `date` alone, or `date to end_date` for multi-day rentals
    pub date_range: String,
    pub guest_count: i32,
    pub notes: String,
    pub total: String,
}

impl BookingDetails {
    pub fn new(booking: &Booking, vehicle_name: &str) -> Self {
        let date = booking.date.format("%Y-%m-%d").to_string();
        let end_date = booking.last_date().format("%Y-%m-%d").to_string();
        let date_range = if end_date != date {
            format!("{} to {}", date, end_date)
        } else {
            date.clone()
        };

        Self {
            customer_name: booking.customer_name.clone(),
            first_name: first_name(&booking.customer_name),
            customer_email: booking.customer_email.clone(),
            customer_phone: booking.customer_phone.clone(),
            vehicle_name: vehicle_name.to_string(),
            date,
            start_time: booking.start_time.format("%H:%M").to_string(),
            end_date,
            end_time: booking.end_time.format("%H:%M").to_string(),
            date_range,
            guest_count: booking.guest_count,
            notes: booking
                .notes
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("None")
                .to_string(),
            total: format_usd(booking.total_price),
        }
    }
}

/// Contact form submission, already trimmed
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

#[derive(Template)]
#[template(path = "email/request_received.txt")]
struct RequestReceivedTemplate<'a> {
    booking: &'a BookingDetails,
}

#[derive(Template)]
#[template(path = "email/staff_booking.txt")]
struct StaffBookingTemplate<'a> {
    booking: &'a BookingDetails,
}

#[derive(Template)]
#[template(path = "email/confirmed.txt")]
struct ConfirmedTemplate<'a> {
    booking: &'a BookingDetails,
}

#[derive(Template)]
#[template(path = "email/rejected.txt")]
struct RejectedTemplate<'a> {
    booking: &'a BookingDetails,
    reason: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactTemplate<'a> {
    message: &'a ContactMessage,
}

/// Customer acknowledgement that the request and hold were received
pub fn request_received(mail: &MailConfig, booking: &BookingDetails) -> Result<Email, NotifyError> {
    Ok(Email {
        from: mail.from.clone(),
        to: booking.customer_email.clone(),
        reply_to: None,
        subject: "Booking Request Received - ATX Boats and Buses".to_string(),
        text: RequestReceivedTemplate { booking }.render()?,
    })
}

/// Staff notice of a new request awaiting approval
pub fn staff_booking_notice(mail: &MailConfig, booking: &BookingDetails) -> Result<Email, NotifyError> {
    Ok(Email {
        from: mail.from.clone(),
        to: mail.staff.clone(),
        reply_to: Some(booking.customer_email.clone()),
        subject: format!("New Booking Request - {} on {}", booking.vehicle_name, booking.date),
        text: StaffBookingTemplate { booking }.render()?,
    })
}

pub fn booking_confirmed(mail: &MailConfig, booking: &BookingDetails) -> Result<Email, NotifyError> {
    Ok(Email {
        from: mail.from.clone(),
        to: booking.customer_email.clone(),
        reply_to: None,
        subject: "Booking Confirmed - ATX Boats and Buses".to_string(),
        text: ConfirmedTemplate { booking }.render()?,
    })
}

pub fn booking_rejected(
    mail: &MailConfig,
    booking: &BookingDetails,
    reason: Option<&str>,
) -> Result<Email, NotifyError> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    Ok(Email {
        from: mail.from.clone(),
        to: booking.customer_email.clone(),
        reply_to: None,
        subject: "Booking Update - ATX Boats and Buses".to_string(),
        text: RejectedTemplate { booking, reason }.render()?,
    })
}

/// Contact form relay to staff, replying to the sender
pub fn contact_message(mail: &MailConfig, message: &ContactMessage) -> Result<Email, NotifyError> {
    Ok(Email {
        from: mail.from.clone(),
        to: mail.staff.clone(),
        reply_to: Some(message.email.clone()),
        subject: "New Contact Form Submission - ATX Boats and Buses".to_string(),
        text: ContactTemplate { message }.render()?,
    })
}

/// First word of a name, or "there" for a blank one.
pub fn first_name(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .next()
        .unwrap_or("there")
        .to_string()
}

/// Format cents as US dollars, e.g. `$1,440.00`.
pub fn format_usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${}.{:02}", sign, grouped, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    use crate::models::BookingStatus;

    fn mail() -> MailConfig {
        MailConfig {
            from: "ATX Boats and Buses <bookings@atxboatsandbuses.com>".to_string(),
            staff: "staff@example.com".to_string(),
        }
    }

    fn booking(end_date: Option<NaiveDate>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            customer_name: "  Pat Doe ".to_string(),
            customer_email: "pat@example.com".to_string(),
            customer_phone: "555-0100".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            end_date,
            guest_count: 12,
            notes: Some(String::new()),
            total_price: 1_008_000,
            status: BookingStatus::PendingApproval,
            created_at: Utc::now(),
            checkout_session_id: "cs_1".to_string(),
            payment_intent_id: Some("pi_1".to_string()),
        }
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0), "$0.00");
        assert_eq!(format_usd(5), "$0.05");
        assert_eq!(format_usd(144_000), "$1,440.00");
        assert_eq!(format_usd(123_456_789), "$1,234,567.89");
        assert_eq!(format_usd(-2_550), "-$25.50");
    }

    #[test]
    fn test_first_name() {
        assert_eq!(first_name("Pat Doe"), "Pat");
        assert_eq!(first_name("   "), "there");
    }

    #[test]
    fn test_details_for_multi_day_booking() {
        let details = BookingDetails::new(
            &booking(NaiveDate::from_ymd_opt(2026, 7, 5)),
            "45 Foot Prevost Tour Bus",
        );

        assert_eq!(details.first_name, "Pat");
        assert_eq!(details.date_range, "2026-07-04 to 2026-07-05");
        assert_eq!(details.start_time, "18:00");
        assert_eq!(details.notes, "None");
        assert_eq!(details.total, "$10,080.00");
    }

    #[test]
    fn test_request_received_mentions_hold() {
        let details = BookingDetails::new(&booking(None), "50 Foot Carver Yacht");
        let email = request_received(&mail(), &details).unwrap();

        assert_eq!(email.to, "pat@example.com");
        assert!(email.text.starts_with("Hi Pat,"));
        assert!(email.text.contains("50 Foot Carver Yacht from 2026-07-04 18:00 to 2026-07-04 11:00"));
        assert!(email.text.contains("payment is on hold"));
    }

    #[test]
    fn test_staff_notice_goes_to_staff() {
        let details = BookingDetails::new(&booking(None), "50 Foot Carver Yacht");
        let email = staff_booking_notice(&mail(), &details).unwrap();

        assert_eq!(email.to, "staff@example.com");
        assert_eq!(email.subject, "New Booking Request - 50 Foot Carver Yacht on 2026-07-04");
        assert!(email.text.contains("Customer phone: 555-0100"));
        assert!(email.text.contains("Total amount: $10,080.00"));
    }

    #[test]
    fn test_rejection_includes_reason_only_when_given() {
        let details = BookingDetails::new(&booking(None), "50 Foot Carver Yacht");

        let with_reason = booking_rejected(&mail(), &details, Some("Lake closed")).unwrap();
        assert!(with_reason.text.contains("Reason: Lake closed"));

        let without = booking_rejected(&mail(), &details, Some("  ")).unwrap();
        assert!(!without.text.contains("Reason:"));
        assert!(without.text.contains("you will not be charged"));
    }

    #[test]
    fn test_confirmation_lists_details() {
        let details = BookingDetails::new(&booking(None), "50 Foot Carver Yacht");
        let email = booking_confirmed(&mail(), &details).unwrap();

        assert!(email.text.contains("Your booking is confirmed!"));
        assert!(email.text.contains("Guest count: 12"));
    }

    #[test]
    fn test_contact_replies_to_sender() {
        let message = ContactMessage {
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            phone: "555-0101".to_string(),
            message: "Do you allow dogs?".to_string(),
        };
        let email = contact_message(&mail(), &message).unwrap();

        assert_eq!(email.to, "staff@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("sam@example.com"));
        assert!(email.text.contains("Do you allow dogs?"));
    }
}
