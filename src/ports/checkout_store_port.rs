use crate::domain::entities::{CartSnapshot, Order};
use crate::domain::errors::DomainResult;
use crate::domain::Payment;
use async_trait::async_trait;
use uuid::Uuid;

/// Ledger store for the checkout flow: pending payments, orders, carts.
///
/// The terminal transitions are conditional writes keyed on the record
/// still being pending, so duplicate or concurrent callback deliveries for
/// the same payment id cannot apply the domain effect twice.
#[async_trait]
pub trait CheckoutStorePort: Send + Sync {
    /// Persists a freshly initiated pending payment
    async fn insert_payment(&self, payment: &Payment) -> DomainResult<()>;

    /// Fetches a payment by the gateway-assigned id
    async fn find_payment(&self, payment_id: &str) -> DomainResult<Option<Payment>>;

    /// Loads the live cart of a user, if any
    async fn find_cart(&self, user_id: Uuid) -> DomainResult<Option<CartSnapshot>>;

    /// Applies the whole checkout effect in one transaction: allocates an
    /// order number, inserts the order built from the payment's snapshot,
    /// flips the payment pending→completed (conditional on it still being
    /// pending) recording the gateway transaction id, and deletes the
    /// user's live cart.
    ///
    /// Returns `DomainError::AlreadyProcessed` — with nothing persisted —
    /// when the conditional update matches no row, i.e. a concurrent
    /// delivery already completed or failed the payment.
    async fn complete_checkout(&self, payment: &Payment, trx_id: &str) -> DomainResult<Order>;

    /// Best-effort terminal write: flips the payment to failed with the
    /// audit stamps carried by `payment`, only if it is still pending.
    /// Returns `false` when the record was already terminal.
    async fn mark_payment_failed(&self, payment: &Payment) -> DomainResult<bool>;
}
