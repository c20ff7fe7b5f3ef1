//! Pricing and checkout module.
//!
//! Rental length rules, price quotes and the checkout flow that turns a
//! priced request into a payment hold.

pub mod calculators;
pub mod requests;
pub mod responses;
pub mod services;

// Re-export commonly used items
pub use calculators::{quote, round_money, to_cents, validate_duration, DurationError, PriceQuote};
pub use services::{create_checkout, CheckoutError};
