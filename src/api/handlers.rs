use crate::application::{
    CheckoutService, ErrorResponse, TopupRequest, WalletService,
};
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{CallbackOutcome, RedirectTarget};
use crate::ports::{BkashPort, CheckoutStorePort, NotificationPort, WalletStorePort};
use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Role required to top up a wallet
const ROLE_RESELLER: &str = "reseller";

/// Application state
pub struct AppState<G, S, W, N>
where
    G: BkashPort,
    S: CheckoutStorePort,
    W: WalletStorePort,
    N: NotificationPort,
{
    pub checkout: Arc<CheckoutService<G, S, N>>,
    pub wallet: Arc<WalletService<G, W>>,
}

impl<G, S, W, N> Clone for AppState<G, S, W, N>
where
    G: BkashPort,
    S: CheckoutStorePort,
    W: WalletStorePort,
    N: NotificationPort,
{
    fn clone(&self) -> Self {
        Self {
            checkout: self.checkout.clone(),
            wallet: self.wallet.clone(),
        }
    }
}

/// Caller identity, resolved by the fronting auth layer and forwarded as
/// headers. Session handling itself lives outside this service.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthedUser {
    pub fn is_reseller(&self) -> bool {
        self.role == ROLE_RESELLER
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "UNAUTHORIZED".to_string(),
                    "Unauthorized".to_string(),
                )),
            )
        };

        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(unauthorized)?;

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("customer")
            .to_string();

        Ok(AuthedUser { user_id, role })
    }
}

/// Callback query parameters. Both are optional so a malformed callback
/// still gets a redirect instead of a 400 body.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(rename = "paymentID")]
    pub payment_id: Option<String>,
    pub status: Option<String>,
}

/// Initiate a checkout payment for the caller's cart
pub async fn initiate_checkout<G, S, W, N>(
    State(state): State<AppState<G, S, W, N>>,
    user: AuthedUser,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)>
where
    G: BkashPort,
    S: CheckoutStorePort,
    W: WalletStorePort,
    N: NotificationPort,
{
    info!("Received checkout request from user: {}", user.user_id);

    state
        .checkout
        .initiate(user.user_id)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)).into_response())
        .map_err(|e| {
            error!("Checkout initiation error: {}", e);
            let status = match e {
                DomainError::ValidationError(_) | DomainError::InvalidAmount(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(ErrorResponse::new("CHECKOUT_ERROR".to_string(), e.to_string())),
            )
        })
}

/// bKash redirect callback for checkout payments.
///
/// Always answers with a redirect: the payer is mid-journey on the
/// gateway's page and an error body would strand them.
pub async fn bkash_checkout_callback<G, S, W, N>(
    State(state): State<AppState<G, S, W, N>>,
    Query(params): Query<CallbackParams>,
) -> Redirect
where
    G: BkashPort,
    S: CheckoutStorePort,
    W: WalletStorePort,
    N: NotificationPort,
{
    let (Some(payment_id), Some(flag)) = (params.payment_id, params.status) else {
        warn!("Checkout callback missing paymentID or status");
        return Redirect::to(&RedirectTarget::OrderError.path());
    };

    let Some(outcome) = CallbackOutcome::parse(&flag) else {
        warn!("Checkout callback with unknown status flag: {}", flag);
        return Redirect::to(&RedirectTarget::OrderError.path());
    };

    match state.checkout.reconcile(&payment_id, outcome).await {
        Ok(target) => Redirect::to(&target.path()),
        Err(e) => {
            error!("bKash checkout callback error: {}", e);
            Redirect::to(&RedirectTarget::OrderError.path())
        }
    }
}

/// Initiate a wallet top-up; reseller accounts only
pub async fn initiate_topup<G, S, W, N>(
    State(state): State<AppState<G, S, W, N>>,
    user: AuthedUser,
    Json(request): Json<TopupRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)>
where
    G: BkashPort,
    S: CheckoutStorePort,
    W: WalletStorePort,
    N: NotificationPort,
{
    if !user.is_reseller() {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "UNAUTHORIZED".to_string(),
                "Unauthorized".to_string(),
            )),
        ));
    }

    info!("Received top-up request from reseller: {}", user.user_id);

    state
        .wallet
        .initiate_topup(user.user_id, request.amount)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)).into_response())
        .map_err(|e| {
            error!("Top-up initiation error: {}", e);
            let status = match e {
                DomainError::ValidationError(_) | DomainError::InvalidAmount(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(ErrorResponse::new("TOPUP_ERROR".to_string(), e.to_string())),
            )
        })
}

/// bKash redirect callback for wallet top-ups
pub async fn bkash_topup_callback<G, S, W, N>(
    State(state): State<AppState<G, S, W, N>>,
    Query(params): Query<CallbackParams>,
) -> Redirect
where
    G: BkashPort,
    S: CheckoutStorePort,
    W: WalletStorePort,
    N: NotificationPort,
{
    let (Some(payment_id), Some(flag)) = (params.payment_id, params.status) else {
        warn!("Top-up callback missing paymentID or status");
        return Redirect::to(&RedirectTarget::WalletError.path());
    };

    let Some(outcome) = CallbackOutcome::parse(&flag) else {
        warn!("Top-up callback with unknown status flag: {}", flag);
        return Redirect::to(&RedirectTarget::WalletError.path());
    };

    match state.wallet.reconcile(&payment_id, outcome).await {
        Ok(target) => Redirect::to(&target.path()),
        Err(e) => {
            error!("bKash top-up callback error: {}", e);
            Redirect::to(&RedirectTarget::WalletError.path())
        }
    }
}

/// Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
