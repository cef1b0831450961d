use crate::domain::errors::DomainResult;
use crate::domain::value_objects::Money;
use crate::domain::WalletTransaction;
use async_trait::async_trait;

/// Ledger store for the wallet top-up flow.
#[async_trait]
pub trait WalletStorePort: Send + Sync {
    /// Persists a freshly initiated pending top-up
    async fn insert_transaction(&self, txn: &WalletTransaction) -> DomainResult<()>;

    /// Fetches a top-up by the gateway-assigned payment id
    async fn find_by_payment_id(&self, payment_id: &str)
        -> DomainResult<Option<WalletTransaction>>;

    /// Applies the credit in one transaction: flips the record
    /// pending→completed (conditional on it still being pending) recording
    /// the gateway transaction id, credits the owner's balance, and stamps
    /// the post-credit balance on the row.
    ///
    /// Returns the new balance, or `DomainError::AlreadyProcessed` when a
    /// concurrent delivery won the conditional update (nothing persists).
    async fn complete_topup(&self, txn: &WalletTransaction, trx_id: &str) -> DomainResult<Money>;

    /// Best-effort terminal write; `false` when no longer pending.
    async fn mark_failed(&self, txn: &WalletTransaction) -> DomainResult<bool>;
}
