use crate::domain::errors::DomainResult;
use crate::domain::events::OrderPlaced;
use async_trait::async_trait;

/// Fan-out sink for order notifications.
///
/// Reconciliation treats this as best-effort: a notification failure is
/// logged, never allowed to fail a committed payment.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Notifies platform admins and, when the order belongs to a reseller
    /// storefront, the reseller
    async fn order_placed(&self, event: &OrderPlaced) -> DomainResult<()>;
}
