use super::handlers::*;
use crate::ports::{BkashPort, CheckoutStorePort, NotificationPort, WalletStorePort};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router<G, S, W, N>(state: AppState<G, S, W, N>) -> Router
where
    G: BkashPort + 'static,
    S: CheckoutStorePort + 'static,
    W: WalletStorePort + 'static,
    N: NotificationPort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/checkout", post(initiate_checkout))
        .route("/api/checkout/bkash/callback", get(bkash_checkout_callback))
        .route("/api/reseller/wallet/topup", post(initiate_topup))
        .route(
            "/api/reseller/wallet/topup/callback",
            get(bkash_topup_callback),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
