use crate::domain::errors::DomainResult;
use crate::domain::value_objects::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Gateway status code that confirms a completed execution
pub const BKASH_STATUS_OK: &str = "0000";

/// Gateway transaction state that confirms a completed execution
pub const BKASH_STATE_COMPLETED: &str = "Completed";

/// Create-payment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBkashPayment {
    pub amount: Money,
    /// Merchant-side reference shown to the payer
    pub payer_reference: String,
    /// Invoice number recorded on the gateway side
    pub merchant_invoice_number: String,
    /// Where the gateway redirects the payer after the attempt
    pub callback_url: String,
}

/// Create-payment response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BkashPaymentCreated {
    pub payment_id: String,
    /// Hosted page the payer is redirected to
    pub bkash_url: String,
}

/// Execute-payment response.
///
/// Returned for any well-formed gateway answer, matching or not; the
/// caller decides what a completed signature looks like. Transport and
/// HTTP-level failures surface as errors instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BkashExecution {
    pub status_code: String,
    pub status_message: Option<String>,
    pub transaction_status: String,
    pub trx_id: Option<String>,
}

impl BkashExecution {
    /// Both fields must match; a single matching field is not sufficient
    /// to treat an ambiguous gateway response as money received.
    pub fn confirms_completion(&self) -> bool {
        self.status_code == BKASH_STATUS_OK
            && self.transaction_status == BKASH_STATE_COMPLETED
            && self.trx_id.is_some()
    }
}

/// bKash gateway port
#[async_trait]
pub trait BkashPort: Send + Sync {
    /// Creates a payment and returns the gateway id plus the hosted
    /// checkout URL to redirect the payer to
    async fn create_payment(
        &self,
        request: CreateBkashPayment,
    ) -> DomainResult<BkashPaymentCreated>;

    /// Executes a payment the payer has authorized on the hosted page
    async fn execute_payment(&self, payment_id: &str) -> DomainResult<BkashExecution>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution(status_code: &str, transaction_status: &str, trx_id: Option<&str>) -> BkashExecution {
        BkashExecution {
            status_code: status_code.to_string(),
            status_message: None,
            transaction_status: transaction_status.to_string(),
            trx_id: trx_id.map(String::from),
        }
    }

    #[test]
    fn test_confirmation_needs_both_fields() {
        assert!(execution("0000", "Completed", Some("8TR1")).confirms_completion());
        // one matching field is not enough
        assert!(!execution("0000", "Initiated", Some("8TR1")).confirms_completion());
        assert!(!execution("2023", "Completed", Some("8TR1")).confirms_completion());
        // no transaction id, nothing to record against the ledger
        assert!(!execution("0000", "Completed", None).confirms_completion());
    }
}
