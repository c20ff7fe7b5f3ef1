//! Shared application state

use std::sync::Arc;

use crate::auth::SessionStore;
use crate::cache::AppCache;
use crate::db::Store;
use crate::notifications::{MailConfig, Notifier};
use crate::payments::PaymentGateway;

/// Settings handlers need at request time
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Shared admin password; login is refused when unset
    pub admin_password: Option<String>,
    pub currency: String,
    pub mail: MailConfig,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub sessions: Arc<dyn SessionStore>,
    pub cache: AppCache,
    pub settings: Arc<AppSettings>,
}
