use crate::domain::entities::CURRENCY_BDT;
use crate::domain::errors::{DomainError, DomainResult};
use crate::infrastructure::config::BkashConfig;
use crate::ports::bkash_port::*;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Granted id token plus its expiry
struct CachedToken {
    id_token: String,
    expires_at: DateTime<Utc>,
}

/// bKash tokenized-checkout adapter
pub struct BkashAdapter {
    config: Arc<BkashConfig>,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl BkashAdapter {
    pub fn new(config: Arc<BkashConfig>) -> Self {
        Self {
            config,
            client: Client::new(),
            token: Mutex::new(None),
        }
    }

    /// Returns a valid id token, granting a fresh one when the cached
    /// token is missing or within a minute of expiry.
    async fn id_token(&self) -> DomainResult<String> {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(cached.id_token.clone());
            }
        }

        let granted = self.grant_token().await?;
        let id_token = granted.id_token.clone();
        *guard = Some(granted);
        Ok(id_token)
    }

    async fn grant_token(&self) -> DomainResult<CachedToken> {
        let url = format!("{}/tokenized/checkout/token/grant", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header("username", &self.config.username)
            .header("password", &self.config.password)
            .header("Accept", "application/json")
            .json(&json!({
                "app_key": self.config.app_key,
                "app_secret": self.config.app_secret,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("bKash token grant error: {} - {}", status, error_text);
            return Err(DomainError::BkashError(format!(
                "Token grant returned {}: {}",
                status, error_text
            )));
        }

        let resp_json: serde_json::Value = response.json().await?;

        let id_token = resp_json["id_token"]
            .as_str()
            .ok_or_else(|| DomainError::BkashError("Missing id_token".to_string()))?
            .to_string();

        // the sandbox reports expires_in as a number, production as a string
        let expires_in = resp_json["expires_in"]
            .as_i64()
            .or_else(|| {
                resp_json["expires_in"]
                    .as_str()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or(3600);

        debug!("bKash token granted, expires in {}s", expires_in);

        Ok(CachedToken {
            id_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        })
    }
}

#[async_trait]
impl BkashPort for BkashAdapter {
    /// Creates a tokenized-checkout payment
    async fn create_payment(
        &self,
        request: CreateBkashPayment,
    ) -> DomainResult<BkashPaymentCreated> {
        let token = self.id_token().await?;
        let url = format!("{}/tokenized/checkout/create", self.config.base_url);

        let body = json!({
            "mode": "0011",
            "payerReference": request.payer_reference,
            "callbackURL": request.callback_url,
            "amount": request.amount.to_taka_string(),
            "currency": CURRENCY_BDT,
            "intent": "sale",
            "merchantInvoiceNumber": request.merchant_invoice_number,
        });

        debug!("bKash create request: {}", body);

        let response = self
            .client
            .post(&url)
            .header("Authorization", token)
            .header("X-APP-Key", &self.config.app_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("bKash create error: {} - {}", status, error_text);
            return Err(DomainError::BkashError(format!(
                "Create returned {}: {}",
                status, error_text
            )));
        }

        let resp_json: serde_json::Value = response.json().await?;
        debug!("bKash create response: {}", resp_json);

        let status_code = resp_json["statusCode"].as_str().unwrap_or("UNKNOWN");
        if status_code != BKASH_STATUS_OK {
            return Err(DomainError::BkashError(format!(
                "Create declined: statusCode={}, statusMessage={}",
                status_code,
                resp_json["statusMessage"].as_str().unwrap_or("")
            )));
        }

        let payment_id = resp_json["paymentID"]
            .as_str()
            .ok_or_else(|| DomainError::BkashError("Missing paymentID".to_string()))?;
        let bkash_url = resp_json["bkashURL"]
            .as_str()
            .ok_or_else(|| DomainError::BkashError("Missing bkashURL".to_string()))?;

        Ok(BkashPaymentCreated {
            payment_id: payment_id.to_string(),
            bkash_url: bkash_url.to_string(),
        })
    }

    /// Executes an authorized payment.
    ///
    /// Any well-formed gateway answer comes back as a `BkashExecution`,
    /// declined ones included; the caller judges the completed signature.
    async fn execute_payment(&self, payment_id: &str) -> DomainResult<BkashExecution> {
        let token = self.id_token().await?;
        let url = format!("{}/tokenized/checkout/execute", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", token)
            .header("X-APP-Key", &self.config.app_key)
            .header("Accept", "application/json")
            .json(&json!({ "paymentID": payment_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("bKash execute error: {} - {}", status, error_text);
            return Err(DomainError::BkashError(format!(
                "Execute returned {}: {}",
                status, error_text
            )));
        }

        let resp_json: serde_json::Value = response.json().await?;
        debug!("bKash execute response: {}", resp_json);

        Ok(BkashExecution {
            status_code: resp_json["statusCode"]
                .as_str()
                .unwrap_or("UNKNOWN")
                .to_string(),
            status_message: resp_json["statusMessage"].as_str().map(String::from),
            transaction_status: resp_json["transactionStatus"]
                .as_str()
                .unwrap_or("Unknown")
                .to_string(),
            trx_id: resp_json["trxID"].as_str().map(String::from),
        })
    }
}
