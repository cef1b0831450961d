use crate::domain::value_objects::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response to a checkout initiation
#[derive(Debug, Serialize)]
pub struct CheckoutInitiated {
    /// Internal payment reference
    #[serde(rename = "paymentRef")]
    pub payment_ref: Uuid,

    /// Hosted gateway page to redirect the payer to
    #[serde(rename = "bkashURL")]
    pub bkash_url: String,
}

/// Wallet top-up request. Amount is in paisa.
#[derive(Debug, Deserialize)]
pub struct TopupRequest {
    pub amount: Money,
}

/// Response to a top-up initiation
#[derive(Debug, Serialize)]
pub struct TopupInitiated {
    #[serde(rename = "transactionId")]
    pub transaction_id: Uuid,

    #[serde(rename = "bkashURL")]
    pub bkash_url: String,
}

/// Structured error body for the JSON endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: String, message: String) -> Self {
        Self { error, message }
    }
}
