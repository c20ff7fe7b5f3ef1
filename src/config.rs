//! Server configuration module

use clap::Parser;

use crate::notifications::MailConfig;
use crate::payments::StripeConfig;

/// Booking server configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "atx-rentals-web", about = "Boat and bus rental booking API", long_about = None)]
pub struct Config {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum pooled database connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub database_max_connections: u32,

    /// Socket address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: String,

    /// Public site URL, used for checkout redirects
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: String,

    /// Shared admin password; admin login fails when unset
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: String,

    #[arg(long, env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    pub stripe_webhook_secret: String,

    /// Three-letter currency code for checkout sessions
    #[arg(long, env = "CURRENCY", default_value = "usd")]
    pub currency: String,

    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: String,

    /// Sender for every outgoing email
    #[arg(
        long,
        env = "MAIL_FROM",
        default_value = "ATX Boats and Buses <bookings@atxboatsandbuses.com>"
    )]
    pub mail_from: String,

    /// Inbox for staff notices and contact messages
    #[arg(long, env = "STAFF_EMAIL", default_value = "bookings@atxboatsandbuses.com")]
    pub staff_email: String,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is missing or malformed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub fn stripe(&self) -> StripeConfig {
        StripeConfig {
            secret_key: self.stripe_secret_key.clone(),
            webhook_secret: self.stripe_webhook_secret.clone(),
            public_base_url: self.public_base_url.clone(),
        }
    }

    pub fn mail(&self) -> MailConfig {
        MailConfig {
            from: self.mail_from.clone(),
            staff: self.staff_email.clone(),
        }
    }
}
