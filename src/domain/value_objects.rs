use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment lifecycle state. Transitions are monotonic: once a record is
/// completed or failed it never moves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created at initiation, waiting for the gateway callback
    Pending,
    /// Payment confirmed and the domain effect applied
    Completed,
    /// Cancelled by the user, declined by the gateway, or execution failed
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// Outcome flag the gateway appends to the callback redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Success,
    Cancel,
    Failure,
}

impl CallbackOutcome {
    /// Parses the `status` query parameter. Anything outside the three
    /// known flags is rejected so the handler can fall back to the error
    /// redirect without touching any state.
    pub fn parse(flag: &str) -> Option<Self> {
        match flag {
            "success" => Some(CallbackOutcome::Success),
            "cancel" => Some(CallbackOutcome::Cancel),
            "failure" => Some(CallbackOutcome::Failure),
            _ => None,
        }
    }
}

/// Why a payment reached the failed state. Cancel and gateway-failure
/// callbacks must stay distinguishable in the stored reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    UserCancelled,
    GatewayFailure,
    /// The execute call answered, but not with the completed signature
    Declined {
        status_code: String,
        transaction_status: String,
    },
    /// The execute call itself failed (transport, HTTP error, bad body)
    ExecutionError(String),
}

impl FailureReason {
    /// A cancel-flavoured reason is stamped as `cancelled_at`/`cancel_reason`,
    /// everything else as `failed_at`/`failure_reason`.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            FailureReason::UserCancelled | FailureReason::GatewayFailure
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::UserCancelled => write!(f, "User cancelled the transaction"),
            FailureReason::GatewayFailure => write!(f, "Payment failed"),
            FailureReason::Declined {
                status_code,
                transaction_status,
            } => write!(
                f,
                "Gateway declined: statusCode={}, transactionStatus={}",
                status_code, transaction_status
            ),
            FailureReason::ExecutionError(msg) => write!(f, "Payment execution failed: {}", msg),
        }
    }
}

/// Monetary amount in paisa (1 BDT = 100 paisa), kept integral to avoid
/// floating point drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    paisa: i64,
}

impl Money {
    pub fn from_taka(amount: i64) -> Self {
        Self {
            paisa: amount * 100,
        }
    }

    pub fn from_paisa(paisa: i64) -> Self {
        Self { paisa }
    }

    pub fn to_paisa(&self) -> i64 {
        self.paisa
    }

    pub fn is_positive(&self) -> bool {
        self.paisa > 0
    }

    /// Two-decimal taka string, the format the gateway expects ("500.00").
    pub fn to_taka_string(&self) -> String {
        format!("{}.{:02}", self.paisa / 100, (self.paisa % 100).abs())
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money {
            paisa: self.paisa + rhs.paisa,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "৳{}", self.to_taka_string())
    }
}

/// Outcome pages the reconciliation flow can land on. Every callback
/// response is one of these, rendered as an HTTP redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    OrderSuccess { order_id: Uuid },
    OrderCancelled { payment_ref: Uuid },
    OrderFailed { payment_ref: Uuid },
    OrderError,
    WalletSuccess,
    WalletCancelled,
    WalletFailed,
    WalletError,
}

impl RedirectTarget {
    pub fn path(&self) -> String {
        match self {
            RedirectTarget::OrderSuccess { order_id } => format!("/orders/{}/success", order_id),
            RedirectTarget::OrderCancelled { payment_ref } => {
                format!("/orders/{}/cancelled", payment_ref)
            }
            RedirectTarget::OrderFailed { payment_ref } => {
                format!("/orders/{}/failed", payment_ref)
            }
            RedirectTarget::OrderError => "/orders/error".to_string(),
            RedirectTarget::WalletSuccess => "/reseller/wallet/success".to_string(),
            RedirectTarget::WalletCancelled => "/reseller/wallet/cancelled".to_string(),
            RedirectTarget::WalletFailed => "/reseller/wallet/failed".to_string(),
            RedirectTarget::WalletError => "/reseller/wallet/error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_taka() {
        let money = Money::from_taka(500);
        assert_eq!(money.to_paisa(), 50000);
        assert_eq!(money.to_taka_string(), "500.00");
    }

    #[test]
    fn test_money_display() {
        let money = Money::from_paisa(12345);
        assert_eq!(format!("{}", money), "৳123.45");
    }

    #[test]
    fn test_money_add() {
        let sum = Money::from_taka(50) + Money::from_taka(100);
        assert_eq!(sum, Money::from_taka(150));
    }

    #[test]
    fn test_callback_outcome_parse() {
        assert_eq!(
            CallbackOutcome::parse("success"),
            Some(CallbackOutcome::Success)
        );
        assert_eq!(
            CallbackOutcome::parse("cancel"),
            Some(CallbackOutcome::Cancel)
        );
        assert_eq!(
            CallbackOutcome::parse("failure"),
            Some(CallbackOutcome::Failure)
        );
        assert_eq!(CallbackOutcome::parse("SUCCESS"), None);
        assert_eq!(CallbackOutcome::parse(""), None);
    }

    #[test]
    fn test_failure_reason_messages_distinguishable() {
        assert_ne!(
            FailureReason::UserCancelled.to_string(),
            FailureReason::GatewayFailure.to_string()
        );
        assert!(FailureReason::UserCancelled.is_cancellation());
        assert!(FailureReason::GatewayFailure.is_cancellation());
        assert!(!FailureReason::ExecutionError("timeout".into()).is_cancellation());
    }

    #[test]
    fn test_payment_status_round_trip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<PaymentStatus>(), Ok(status));
        }
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_redirect_target_paths() {
        let order_id = Uuid::new_v4();
        assert_eq!(
            RedirectTarget::OrderSuccess { order_id }.path(),
            format!("/orders/{}/success", order_id)
        );
        assert_eq!(RedirectTarget::WalletError.path(), "/reseller/wallet/error");
    }
}
