use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atx_rentals_web::auth::MemorySessionStore;
use atx_rentals_web::cache::{start_cache_warmer, AppCache};
use atx_rentals_web::config::Config;
use atx_rentals_web::db::PgStore;
use atx_rentals_web::notifications::ResendClient;
use atx_rentals_web::payments::StripeClient;
use atx_rentals_web::routes;
use atx_rentals_web::state::{AppSettings, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atx_rentals_web=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().unwrap_or_else(|e| e.exit());

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    if config.admin_password.is_none() {
        tracing::warn!("ADMIN_PASSWORD is not set; admin login is disabled");
    }

    let store = Arc::new(PgStore::new(pool));
    let cache = AppCache::new();

    let state = AppState {
        store: store.clone(),
        payments: Arc::new(StripeClient::new(config.stripe())),
        notifier: Arc::new(ResendClient::new(config.resend_api_key.clone())),
        sessions: Arc::new(MemorySessionStore::new()),
        cache: cache.clone(),
        settings: Arc::new(AppSettings {
            admin_password: config.admin_password.clone(),
            currency: config.currency.clone(),
            mail: config.mail(),
        }),
    };

    tokio::spawn(start_cache_warmer(cache, store));

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
