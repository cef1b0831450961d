use crate::application::dto::TopupInitiated;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{CallbackOutcome, FailureReason, Money, PaymentStatus, RedirectTarget};
use crate::domain::WalletTransaction;
use crate::ports::bkash_port::CreateBkashPayment;
use crate::ports::{BkashPort, WalletStorePort};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Reseller wallet top-up flow: initiation and callback reconciliation.
pub struct WalletService<G: BkashPort, S: WalletStorePort> {
    gateway: Arc<G>,
    store: Arc<S>,
    /// Absolute URL the gateway redirects the payer back to
    callback_url: String,
}

impl<G: BkashPort, S: WalletStorePort> WalletService<G, S> {
    pub fn new(gateway: Arc<G>, store: Arc<S>, callback_url: String) -> Self {
        Self {
            gateway,
            store,
            callback_url,
        }
    }

    /// Initiates a top-up payment. The balance stays untouched until the
    /// callback confirms the money.
    pub async fn initiate_topup(
        &self,
        user_id: Uuid,
        amount: Money,
    ) -> DomainResult<TopupInitiated> {
        info!("Initiating wallet top-up for user: {}", user_id);

        if !amount.is_positive() {
            return Err(DomainError::InvalidAmount(
                "Top-up amount must be greater than 0".to_string(),
            ));
        }

        // 1. Create the gateway payment
        let reference = format!("wallet-topup-{}-{}", user_id, Utc::now().timestamp_millis());
        let created = self
            .gateway
            .create_payment(CreateBkashPayment {
                amount,
                payer_reference: reference.clone(),
                merchant_invoice_number: reference,
                callback_url: self.callback_url.clone(),
            })
            .await?;

        // 2. Persist the pending record
        let txn = WalletTransaction::new_topup(created.payment_id, user_id, amount)?;
        self.store.insert_transaction(&txn).await?;
        debug!("Pending top-up saved: {}", txn.payment_id);

        Ok(TopupInitiated {
            transaction_id: txn.id,
            bkash_url: created.bkash_url,
        })
    }

    /// Reconciles a gateway callback for a wallet top-up. Mirrors the
    /// checkout reconciliation: the balance credit is applied exactly once
    /// per payment id, in the same atomic step that completes the record.
    pub async fn reconcile(
        &self,
        payment_id: &str,
        outcome: CallbackOutcome,
    ) -> DomainResult<RedirectTarget> {
        info!("Reconciling top-up callback: {}", payment_id);

        // 1. Lookup; unknown ids mutate nothing
        let Some(txn) = self.store.find_by_payment_id(payment_id).await? else {
            warn!("Wallet transaction not found: {}", payment_id);
            return Ok(RedirectTarget::WalletError);
        };

        // 2. Idempotency short-circuit for duplicate deliveries
        if txn.status == PaymentStatus::Completed {
            debug!("Top-up already completed: {}", payment_id);
            return Ok(RedirectTarget::WalletSuccess);
        }

        // 3. Failed is terminal
        if txn.status == PaymentStatus::Failed {
            debug!("Top-up already failed: {}", payment_id);
            return Ok(RedirectTarget::WalletFailed);
        }

        match outcome {
            CallbackOutcome::Success => self.reconcile_success(txn).await,
            CallbackOutcome::Cancel => {
                self.record_failure(txn, FailureReason::UserCancelled).await?;
                Ok(RedirectTarget::WalletCancelled)
            }
            CallbackOutcome::Failure => {
                self.record_failure(txn, FailureReason::GatewayFailure).await?;
                Ok(RedirectTarget::WalletFailed)
            }
        }
    }

    async fn reconcile_success(&self, txn: WalletTransaction) -> DomainResult<RedirectTarget> {
        // 1. Confirm with the gateway
        let execution = match self.gateway.execute_payment(&txn.payment_id).await {
            Ok(execution) => execution,
            Err(e) => {
                error!("Top-up execution error: {}", e);
                self.record_failure(txn, FailureReason::ExecutionError(e.to_string()))
                    .await?;
                return Ok(RedirectTarget::WalletError);
            }
        };

        let Some(trx_id) = execution
            .trx_id
            .clone()
            .filter(|_| execution.confirms_completion())
        else {
            warn!(
                "Gateway did not confirm completion for {}: statusCode={}, transactionStatus={}",
                txn.payment_id, execution.status_code, execution.transaction_status
            );
            self.record_failure(
                txn,
                FailureReason::Declined {
                    status_code: execution.status_code,
                    transaction_status: execution.transaction_status,
                },
            )
            .await?;
            return Ok(RedirectTarget::WalletError);
        };

        // 2. Atomically: complete the record and credit the balance
        match self.store.complete_topup(&txn, &trx_id).await {
            Ok(balance) => {
                info!(
                    "Wallet credited for user {}: new balance {}",
                    txn.user_id, balance
                );
                Ok(RedirectTarget::WalletSuccess)
            }
            Err(DomainError::AlreadyProcessed(_)) => {
                // a concurrent delivery credited first; this one is a no-op
                debug!("Lost completion race for {}", txn.payment_id);
                let current = self.store.find_by_payment_id(&txn.payment_id).await?;
                Ok(match current.map(|t| t.status) {
                    Some(PaymentStatus::Completed) => RedirectTarget::WalletSuccess,
                    _ => RedirectTarget::WalletError,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn record_failure(
        &self,
        mut txn: WalletTransaction,
        reason: FailureReason,
    ) -> DomainResult<WalletTransaction> {
        txn.mark_failed(&reason)?;
        let updated = self.store.mark_failed(&txn).await?;
        if !updated {
            debug!(
                "Top-up {} already terminal, skipping failure write",
                txn.payment_id
            );
        }
        Ok(txn)
    }
}
