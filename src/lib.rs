//! ATX Boats and Buses booking backend
//!
//! Customers check out against a held payment; an admin approval later
//! captures or releases it.

pub mod auth;
pub mod availability;
pub mod booking;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod payments;
pub mod pricing;
pub mod routes;
pub mod state;

pub use state::AppState;
