use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{FailureReason, Money, PaymentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Currency every payment is denominated in
pub const CURRENCY_BDT: &str = "BDT";

/// One line of a cart, frozen at payment initiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub sub_product_name: Option<String>,
}

/// Snapshot of a user's cart, captured when the payment is created.
///
/// The order is materialized from this snapshot, never from the live cart:
/// by the time the gateway callback arrives the cart may have changed or
/// been cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: Money,
    /// Store owner, when the cart belongs to a reseller storefront
    pub reseller_id: Option<Uuid>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Pending payment for the checkout flow.
///
/// Created when the user initiates checkout, mutated exactly once by the
/// callback reconciliation, never deleted. The cart snapshot is the typed
/// payload needed to build the order later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Internal id
    pub id: Uuid,

    /// Opaque id assigned by the gateway at creation; idempotency key
    pub payment_id: String,

    /// Cart owner
    pub user_id: Uuid,

    pub amount: Money,

    pub currency: String,

    pub status: PaymentStatus,

    /// Gateway transaction id, set when the payment completes
    pub trx_id: Option<String>,

    /// Order created by a successful reconciliation
    pub order_id: Option<Uuid>,

    pub cart: CartSnapshot,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub completed_at: Option<DateTime<Utc>>,

    pub failed_at: Option<DateTime<Utc>>,

    pub cancelled_at: Option<DateTime<Utc>>,

    pub failure_reason: Option<String>,

    pub cancel_reason: Option<String>,
}

impl Payment {
    pub fn new(payment_id: String, user_id: Uuid, cart: CartSnapshot) -> DomainResult<Self> {
        if payment_id.is_empty() {
            return Err(DomainError::ValidationError(
                "Gateway payment id must not be empty".to_string(),
            ));
        }

        if cart.is_empty() {
            return Err(DomainError::ValidationError(
                "Cart is empty".to_string(),
            ));
        }

        if !cart.total.is_positive() {
            return Err(DomainError::InvalidAmount(
                "Cart total must be greater than 0".to_string(),
            ));
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            payment_id,
            user_id,
            amount: cart.total,
            currency: CURRENCY_BDT.to_string(),
            status: PaymentStatus::Pending,
            trx_id: None,
            order_id: None,
            cart,
            created_at: now,
            updated_at: now,
            completed_at: None,
            failed_at: None,
            cancelled_at: None,
            failure_reason: None,
            cancel_reason: None,
        })
    }

    /// Marks the payment completed. Legal only from pending.
    pub fn mark_completed(&mut self, trx_id: String, order_id: Uuid) -> DomainResult<()> {
        self.ensure_pending()?;

        self.status = PaymentStatus::Completed;
        self.trx_id = Some(trx_id);
        self.order_id = Some(order_id);
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the payment failed, stamping the reason on the matching audit
    /// field (cancel vs failure).
    pub fn mark_failed(&mut self, reason: &FailureReason) -> DomainResult<()> {
        self.ensure_pending()?;

        self.status = PaymentStatus::Failed;
        let now = Utc::now();
        if reason.is_cancellation() {
            self.cancelled_at = Some(now);
            self.cancel_reason = Some(reason.to_string());
        } else {
            self.failed_at = Some(now);
            self.failure_reason = Some(reason.to_string());
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_pending(&self) -> DomainResult<()> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::InvalidState {
                expected: PaymentStatus::Pending.to_string(),
                actual: self.status.to_string(),
            });
        }
        Ok(())
    }
}

/// Order line, copied from the cart snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub sub_product_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Processing => write!(f, "processing"),
            OrderStatus::Shipped => write!(f, "shipped"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Payment details embedded in the order for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaymentInfo {
    pub provider: String,
    pub payment_id: String,
    pub trx_id: String,
    pub amount: Money,
    pub currency: String,
}

/// Customer order. Only ever created as the side effect of a successful
/// payment reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub reseller_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment: OrderPaymentInfo,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds the order from the snapshot a completed payment carries.
    pub fn from_payment(order_number: String, payment: &Payment, trx_id: &str) -> Self {
        let items = payment
            .cart
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id,
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                sub_product_name: item.sub_product_name.clone(),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            order_number,
            customer_id: payment.user_id,
            reseller_id: payment.cart.reseller_id,
            items,
            total: payment.cart.total,
            status: OrderStatus::Processing,
            payment: OrderPaymentInfo {
                provider: "bkash".to_string(),
                payment_id: payment.payment_id.clone(),
                trx_id: trx_id.to_string(),
                amount: payment.amount,
                currency: payment.currency.clone(),
            },
            created_at: Utc::now(),
        }
    }

    /// Renders a date-prefixed order number, e.g. `ORD2608060001` for the
    /// first order of 2026-08-06. The sequence comes from a per-day atomic
    /// counter, so numbers are unique under concurrent order creation.
    pub fn format_number(date: NaiveDate, sequence: u64) -> String {
        format!("ORD{}{:04}", date.format("%y%m%d"), sequence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Credit => write!(f, "credit"),
            TransactionKind::Debit => write!(f, "debit"),
        }
    }
}

/// Pending payment for the wallet top-up flow. Mirrors [`Payment`]'s
/// lifecycle; completing it credits the owner's balance in the same atomic
/// step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,

    /// Wallet owner
    pub user_id: Uuid,

    /// Opaque id assigned by the gateway; idempotency key
    pub payment_id: String,

    pub kind: TransactionKind,

    pub amount: Money,

    /// Balance after the credit; unset until completion
    pub balance: Option<Money>,

    pub description: String,

    pub status: PaymentStatus,

    pub trx_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub completed_at: Option<DateTime<Utc>>,

    pub failed_at: Option<DateTime<Utc>>,

    pub cancelled_at: Option<DateTime<Utc>>,

    pub failure_reason: Option<String>,

    pub cancel_reason: Option<String>,
}

impl WalletTransaction {
    pub fn new_topup(payment_id: String, user_id: Uuid, amount: Money) -> DomainResult<Self> {
        if payment_id.is_empty() {
            return Err(DomainError::ValidationError(
                "Gateway payment id must not be empty".to_string(),
            ));
        }

        if !amount.is_positive() {
            return Err(DomainError::InvalidAmount(
                "Top-up amount must be greater than 0".to_string(),
            ));
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            payment_id,
            kind: TransactionKind::Credit,
            amount,
            balance: None,
            description: "Wallet Top Up".to_string(),
            status: PaymentStatus::Pending,
            trx_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            failed_at: None,
            cancelled_at: None,
            failure_reason: None,
            cancel_reason: None,
        })
    }

    /// Marks the top-up completed with the gateway transaction id. The
    /// post-credit balance is stamped by the store inside the committing
    /// transaction, where it is actually known.
    pub fn mark_completed(&mut self, trx_id: String) -> DomainResult<()> {
        self.ensure_pending()?;

        self.status = PaymentStatus::Completed;
        self.trx_id = Some(trx_id);
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_failed(&mut self, reason: &FailureReason) -> DomainResult<()> {
        self.ensure_pending()?;

        self.status = PaymentStatus::Failed;
        let now = Utc::now();
        if reason.is_cancellation() {
            self.cancelled_at = Some(now);
            self.cancel_reason = Some(reason.to_string());
        } else {
            self.failed_at = Some(now);
            self.failure_reason = Some(reason.to_string());
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_pending(&self) -> DomainResult<()> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::InvalidState {
                expected: PaymentStatus::Pending.to_string(),
                actual: self.status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cart() -> CartSnapshot {
        CartSnapshot {
            items: vec![CartItem {
                product_id: Uuid::new_v4(),
                name: "Netflix 1 Month".to_string(),
                quantity: 2,
                unit_price: Money::from_taka(250),
                sub_product_name: Some("Shared profile".to_string()),
            }],
            total: Money::from_taka(500),
            reseller_id: None,
        }
    }

    #[test]
    fn test_new_payment_is_pending() {
        let payment = Payment::new("TR0011AB".to_string(), Uuid::new_v4(), sample_cart()).unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount, Money::from_taka(500));
        assert_eq!(payment.currency, CURRENCY_BDT);
        assert!(!payment.is_terminal());
    }

    #[test]
    fn test_new_payment_rejects_empty_cart() {
        let cart = CartSnapshot {
            items: vec![],
            total: Money::from_taka(0),
            reseller_id: None,
        };
        assert!(Payment::new("TR0011AB".to_string(), Uuid::new_v4(), cart).is_err());
    }

    #[test]
    fn test_mark_completed() {
        let mut payment =
            Payment::new("TR0011AB".to_string(), Uuid::new_v4(), sample_cart()).unwrap();
        let order_id = Uuid::new_v4();

        payment
            .mark_completed("8TR9012345".to_string(), order_id)
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.trx_id.as_deref(), Some("8TR9012345"));
        assert_eq!(payment.order_id, Some(order_id));
        assert!(payment.completed_at.is_some());
        assert!(payment.is_terminal());
    }

    #[test]
    fn test_terminal_states_do_not_transition() {
        let mut payment =
            Payment::new("TR0011AB".to_string(), Uuid::new_v4(), sample_cart()).unwrap();
        payment.mark_failed(&FailureReason::UserCancelled).unwrap();

        // failed is terminal, a late success must not resurrect it
        let err = payment.mark_completed("8TR9012345".to_string(), Uuid::new_v4());
        assert!(matches!(err, Err(DomainError::InvalidState { .. })));

        let err = payment.mark_failed(&FailureReason::GatewayFailure);
        assert!(matches!(err, Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn test_cancel_and_failure_stamps_differ() {
        let mut cancelled =
            Payment::new("TRA".to_string(), Uuid::new_v4(), sample_cart()).unwrap();
        cancelled
            .mark_failed(&FailureReason::UserCancelled)
            .unwrap();
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(
            cancelled.cancel_reason.as_deref(),
            Some("User cancelled the transaction")
        );
        assert!(cancelled.failed_at.is_none());

        let mut failed = Payment::new("TRB".to_string(), Uuid::new_v4(), sample_cart()).unwrap();
        failed
            .mark_failed(&FailureReason::ExecutionError("timeout".to_string()))
            .unwrap();
        assert!(failed.failed_at.is_some());
        assert!(failed.cancelled_at.is_none());
        assert_eq!(
            failed.failure_reason.as_deref(),
            Some("Payment execution failed: timeout")
        );
    }

    #[test]
    fn test_order_from_payment_copies_snapshot() {
        let payment = Payment::new("TR0011AB".to_string(), Uuid::new_v4(), sample_cart()).unwrap();
        let order = Order::from_payment("ORD2608060001".to_string(), &payment, "8TR9012345");

        assert_eq!(order.total, Money::from_taka(500));
        assert_eq!(order.customer_id, payment.user_id);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment.provider, "bkash");
        assert_eq!(order.payment.payment_id, "TR0011AB");
        assert_eq!(order.payment.trx_id, "8TR9012345");
    }

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(Order::format_number(date, 1), "ORD2608060001");
        assert_eq!(Order::format_number(date, 12345), "ORD26080612345");
    }

    #[test]
    fn test_topup_lifecycle() {
        let mut txn =
            WalletTransaction::new_topup("TR0011AB".to_string(), Uuid::new_v4(), Money::from_taka(100))
                .unwrap();
        assert_eq!(txn.status, PaymentStatus::Pending);
        assert_eq!(txn.kind, TransactionKind::Credit);
        assert!(txn.balance.is_none());

        txn.mark_completed("8TR9012345".to_string()).unwrap();
        assert_eq!(txn.status, PaymentStatus::Completed);
        assert!(txn.completed_at.is_some());
    }

    #[test]
    fn test_topup_rejects_non_positive_amount() {
        let result =
            WalletTransaction::new_topup("TR0011AB".to_string(), Uuid::new_v4(), Money::from_taka(0));
        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
    }
}
