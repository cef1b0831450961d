use crate::application::dto::CheckoutInitiated;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::events::OrderPlaced;
use crate::domain::value_objects::{CallbackOutcome, FailureReason, PaymentStatus, RedirectTarget};
use crate::domain::Payment;
use crate::ports::bkash_port::CreateBkashPayment;
use crate::ports::{BkashPort, CheckoutStorePort, NotificationPort};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Checkout flow: payment initiation and callback reconciliation.
pub struct CheckoutService<G: BkashPort, S: CheckoutStorePort, N: NotificationPort> {
    gateway: Arc<G>,
    store: Arc<S>,
    notifier: Arc<N>,
    /// Absolute URL the gateway redirects the payer back to
    callback_url: String,
}

impl<G: BkashPort, S: CheckoutStorePort, N: NotificationPort> CheckoutService<G, S, N> {
    pub fn new(gateway: Arc<G>, store: Arc<S>, notifier: Arc<N>, callback_url: String) -> Self {
        Self {
            gateway,
            store,
            notifier,
            callback_url,
        }
    }

    /// Initiates a checkout payment for the user's live cart.
    ///
    /// The cart is snapshotted into the pending payment so the order can be
    /// materialized later even if the cart changes before the callback.
    pub async fn initiate(&self, user_id: Uuid) -> DomainResult<CheckoutInitiated> {
        info!("Initiating checkout for user: {}", user_id);

        // 1. Load the live cart
        let cart = self
            .store
            .find_cart(user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or_else(|| DomainError::ValidationError("Cart is empty".to_string()))?;

        // 2. Create the gateway payment
        let created = self
            .gateway
            .create_payment(CreateBkashPayment {
                amount: cart.total,
                payer_reference: user_id.to_string(),
                merchant_invoice_number: format!("INV{}", Uuid::new_v4().simple()),
                callback_url: self.callback_url.clone(),
            })
            .await?;

        // 3. Persist the pending record with the snapshot
        let payment = Payment::new(created.payment_id, user_id, cart)?;
        self.store.insert_payment(&payment).await?;
        debug!("Pending payment saved: {}", payment.payment_id);

        Ok(CheckoutInitiated {
            payment_ref: payment.id,
            bkash_url: created.bkash_url,
        })
    }

    /// Reconciles a gateway callback for a checkout payment.
    ///
    /// Always resolves to a redirect target; gateway failures are recorded
    /// on the payment record, never surfaced to the payer as an error
    /// response. Only storage errors propagate, and the handler's outer
    /// guard turns those into the error redirect too.
    pub async fn reconcile(
        &self,
        payment_id: &str,
        outcome: CallbackOutcome,
    ) -> DomainResult<RedirectTarget> {
        info!("Reconciling checkout callback: {}", payment_id);

        // 1. Lookup; unknown ids mutate nothing (forged or stale callback)
        let Some(payment) = self.store.find_payment(payment_id).await? else {
            warn!("Payment not found: {}", payment_id);
            return Ok(RedirectTarget::OrderError);
        };

        // 2. Idempotency short-circuit: the gateway retries callbacks, a
        //    completed payment must not re-run any side effect
        if payment.status == PaymentStatus::Completed {
            debug!("Payment already completed: {}", payment_id);
            return Ok(match payment.order_id {
                Some(order_id) => RedirectTarget::OrderSuccess { order_id },
                None => RedirectTarget::OrderError,
            });
        }

        // 3. Failed is terminal; a late success callback cannot resurrect it
        if payment.status == PaymentStatus::Failed {
            debug!("Payment already failed: {}", payment_id);
            return Ok(RedirectTarget::OrderFailed {
                payment_ref: payment.id,
            });
        }

        match outcome {
            CallbackOutcome::Success => self.reconcile_success(payment).await,
            CallbackOutcome::Cancel => {
                let payment = self
                    .record_failure(payment, FailureReason::UserCancelled)
                    .await?;
                Ok(RedirectTarget::OrderCancelled {
                    payment_ref: payment.id,
                })
            }
            CallbackOutcome::Failure => {
                let payment = self
                    .record_failure(payment, FailureReason::GatewayFailure)
                    .await?;
                Ok(RedirectTarget::OrderFailed {
                    payment_ref: payment.id,
                })
            }
        }
    }

    async fn reconcile_success(&self, payment: Payment) -> DomainResult<RedirectTarget> {
        // 1. Confirm with the gateway before touching any state
        let execution = match self.gateway.execute_payment(&payment.payment_id).await {
            Ok(execution) => execution,
            Err(e) => {
                error!("Payment execution error: {}", e);
                self.record_failure(payment, FailureReason::ExecutionError(e.to_string()))
                    .await?;
                return Ok(RedirectTarget::OrderError);
            }
        };

        // 2. Both status code and transaction state must match; an
        //    ambiguous response is treated as not paid
        let Some(trx_id) = execution
            .trx_id
            .clone()
            .filter(|_| execution.confirms_completion())
        else {
            warn!(
                "Gateway did not confirm completion for {}: statusCode={}, transactionStatus={}",
                payment.payment_id, execution.status_code, execution.transaction_status
            );
            self.record_failure(
                payment,
                FailureReason::Declined {
                    status_code: execution.status_code,
                    transaction_status: execution.transaction_status,
                },
            )
            .await?;
            return Ok(RedirectTarget::OrderError);
        };

        // 3. Atomically: create the order, complete the payment, clear the
        //    cart. All or nothing.
        let order = match self.store.complete_checkout(&payment, &trx_id).await {
            Ok(order) => order,
            Err(DomainError::AlreadyProcessed(_)) => {
                // A concurrent delivery committed first; behave like the
                // duplicate it is
                debug!("Lost completion race for {}", payment.payment_id);
                let current = self.store.find_payment(&payment.payment_id).await?;
                let order_id = current
                    .filter(|p| p.status == PaymentStatus::Completed)
                    .and_then(|p| p.order_id);
                return Ok(match order_id {
                    Some(order_id) => RedirectTarget::OrderSuccess { order_id },
                    None => RedirectTarget::OrderError,
                });
            }
            Err(e) => return Err(e),
        };

        info!(
            "Order {} created for payment {}",
            order.order_number, payment.payment_id
        );

        // 4. Best-effort notification fan-out; the payment is committed,
        //    a notifier hiccup must not fail the callback
        let event = OrderPlaced::from_order(&order);
        if let Err(e) = self.notifier.order_placed(&event).await {
            warn!("Order notification failed for {}: {}", order.order_number, e);
        }

        Ok(RedirectTarget::OrderSuccess { order_id: order.id })
    }

    /// Terminal failure write. Best-effort: losing the conditional update
    /// to a concurrent delivery is fine, the record is terminal either way.
    async fn record_failure(
        &self,
        mut payment: Payment,
        reason: FailureReason,
    ) -> DomainResult<Payment> {
        payment.mark_failed(&reason)?;
        let updated = self.store.mark_payment_failed(&payment).await?;
        if !updated {
            debug!(
                "Payment {} already terminal, skipping failure write",
                payment.payment_id
            );
        }
        Ok(payment)
    }
}
