mod api;
mod application;
mod domain;
mod infrastructure;
mod ports;

use api::AppState;
use application::{CheckoutService, WalletService};
use infrastructure::{BkashAdapter, BkashConfig, MySqlCheckoutStore, MySqlNotifier, MySqlWalletStore};
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Environment
    dotenvy::dotenv().ok();

    info!("Starting Storefront Payment Service...");

    // Database pool: constructed here, injected below, closed on shutdown
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");
    info!("Connecting to database...");

    let pool = Arc::new(MySqlPool::connect(&database_url).await?);
    sqlx::migrate!().run(pool.as_ref()).await?;
    info!("Database connected, migrations applied");

    // bKash gateway
    let bkash_config = BkashConfig::from_env();
    info!("bKash configuration loaded for app key: {}", bkash_config.app_key);
    let gateway = Arc::new(BkashAdapter::new(bkash_config));

    // Stores
    let checkout_store = Arc::new(MySqlCheckoutStore::new(pool.clone()));
    let wallet_store = Arc::new(MySqlWalletStore::new(pool.clone()));
    let notifier = Arc::new(MySqlNotifier::new(pool.clone()));

    // Services
    let public_base_url = std::env::var("PUBLIC_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    let checkout_service = Arc::new(CheckoutService::new(
        gateway.clone(),
        checkout_store,
        notifier,
        format!("{}/api/checkout/bkash/callback", public_base_url),
    ));
    let wallet_service = Arc::new(WalletService::new(
        gateway,
        wallet_store,
        format!("{}/api/reseller/wallet/topup/callback", public_base_url),
    ));

    let app_state = AppState {
        checkout: checkout_service,
        wallet: wallet_service,
    };

    // Router
    let app = api::create_router(app_state);

    // Server
    let host = std::env::var("SERVER_HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("SERVER_PORT")
        .unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    info!("Server listening on {}", addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  POST /api/checkout - Initiate checkout payment");
    info!("  GET  /api/checkout/bkash/callback - bKash checkout callback");
    info!("  POST /api/reseller/wallet/topup - Initiate wallet top-up");
    info!("  GET  /api/reseller/wallet/topup/callback - bKash top-up callback");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("Shutdown signal received");
}
