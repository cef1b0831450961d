use crate::domain::entities::{CartItem, CartSnapshot, Order};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Money, PaymentStatus};
use crate::domain::Payment;
use crate::ports::checkout_store_port::CheckoutStorePort;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// MySQL checkout ledger: payments, orders, carts, order counters.
#[derive(Clone)]
pub struct MySqlCheckoutStore {
    pool: Arc<Pool<MySql>>,
}

impl MySqlCheckoutStore {
    pub fn new(pool: Arc<Pool<MySql>>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutStorePort for MySqlCheckoutStore {
    /// Saves a freshly initiated pending payment
    async fn insert_payment(&self, payment: &Payment) -> DomainResult<()> {
        let query = r#"
            INSERT INTO payments (
                id, payment_id, user_id, amount, currency, status,
                trx_id, order_id, cart, created_at, updated_at,
                completed_at, failed_at, cancelled_at,
                failure_reason, cancel_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(payment.id)
            .bind(&payment.payment_id)
            .bind(payment.user_id)
            .bind(payment.amount.to_paisa())
            .bind(&payment.currency)
            .bind(payment.status.to_string())
            .bind(&payment.trx_id)
            .bind(payment.order_id)
            .bind(Json(&payment.cart))
            .bind(payment.created_at)
            .bind(payment.updated_at)
            .bind(payment.completed_at)
            .bind(payment.failed_at)
            .bind(payment.cancelled_at)
            .bind(&payment.failure_reason)
            .bind(&payment.cancel_reason)
            .execute(self.pool.as_ref())
            .await?;

        debug!("Payment saved: {}", payment.payment_id);
        Ok(())
    }

    /// Fetches a payment by the gateway-assigned id
    async fn find_payment(&self, payment_id: &str) -> DomainResult<Option<Payment>> {
        let query = r#"
            SELECT id, payment_id, user_id, amount, currency, status,
                   trx_id, order_id, cart, created_at, updated_at,
                   completed_at, failed_at, cancelled_at,
                   failure_reason, cancel_reason
            FROM payments
            WHERE payment_id = ?
        "#;

        let result = sqlx::query_as::<_, PaymentRow>(query)
            .bind(payment_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        result.map(|row| row.into_payment()).transpose()
    }

    /// Loads the live cart of a user
    async fn find_cart(&self, user_id: Uuid) -> DomainResult<Option<CartSnapshot>> {
        let query = r#"
            SELECT items, total, reseller_id
            FROM carts
            WHERE user_id = ?
        "#;

        let result = sqlx::query_as::<_, CartRow>(query)
            .bind(user_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(result.map(|row| row.into_snapshot()))
    }

    /// One transaction: order number, order insert, conditional payment
    /// completion, cart delete. Nothing persists unless all of it does.
    async fn complete_checkout(&self, payment: &Payment, trx_id: &str) -> DomainResult<Order> {
        let mut tx = self.pool.begin().await?;

        // per-day counter; LAST_INSERT_ID makes the bump-and-read atomic
        let day = Utc::now().date_naive();
        sqlx::query(
            r#"
            INSERT INTO order_counters (day, seq) VALUES (?, LAST_INSERT_ID(1))
            ON DUPLICATE KEY UPDATE seq = LAST_INSERT_ID(seq + 1)
            "#,
        )
        .bind(day.format("%y%m%d").to_string())
        .execute(&mut *tx)
        .await?;

        let seq: u64 = sqlx::query_scalar("SELECT LAST_INSERT_ID()")
            .fetch_one(&mut *tx)
            .await?;

        let order = Order::from_payment(Order::format_number(day, seq), payment, trx_id);

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_id, reseller_id, items, total,
                status, payment_provider, payment_id, payment_trx_id,
                payment_amount, payment_currency, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.customer_id)
        .bind(order.reseller_id)
        .bind(Json(&order.items))
        .bind(order.total.to_paisa())
        .bind(order.status.to_string())
        .bind(&order.payment.provider)
        .bind(&order.payment.payment_id)
        .bind(&order.payment.trx_id)
        .bind(order.payment.amount.to_paisa())
        .bind(&order.payment.currency)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        // the entity validates the transition, the WHERE clause enforces it
        // against concurrent deliveries
        let mut completed = payment.clone();
        completed.mark_completed(trx_id.to_string(), order.id)?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, trx_id = ?, order_id = ?, completed_at = ?, updated_at = ?
            WHERE payment_id = ? AND status = 'pending'
            "#,
        )
        .bind(completed.status.to_string())
        .bind(&completed.trx_id)
        .bind(completed.order_id)
        .bind(completed.completed_at)
        .bind(completed.updated_at)
        .bind(&completed.payment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            tx.rollback().await?;
            return Err(DomainError::AlreadyProcessed(payment.payment_id.clone()));
        }

        sqlx::query("DELETE FROM carts WHERE user_id = ?")
            .bind(payment.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            "Checkout completed: payment {} -> order {}",
            payment.payment_id, order.order_number
        );
        Ok(order)
    }

    /// Conditional terminal write; false when the record is no longer
    /// pending (a concurrent delivery got there first)
    async fn mark_payment_failed(&self, payment: &Payment) -> DomainResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, failed_at = ?, cancelled_at = ?,
                failure_reason = ?, cancel_reason = ?, updated_at = ?
            WHERE payment_id = ? AND status = 'pending'
            "#,
        )
        .bind(payment.status.to_string())
        .bind(payment.failed_at)
        .bind(payment.cancelled_at)
        .bind(&payment.failure_reason)
        .bind(&payment.cancel_reason)
        .bind(payment.updated_at)
        .bind(&payment.payment_id)
        .execute(self.pool.as_ref())
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

/// Database row for payments
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    payment_id: String,
    user_id: Uuid,
    amount: i64,
    currency: String,
    status: String,
    trx_id: Option<String>,
    order_id: Option<Uuid>,
    cart: Json<CartSnapshot>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    failed_at: Option<chrono::DateTime<chrono::Utc>>,
    cancelled_at: Option<chrono::DateTime<chrono::Utc>>,
    failure_reason: Option<String>,
    cancel_reason: Option<String>,
}

impl PaymentRow {
    fn into_payment(self) -> DomainResult<Payment> {
        let status = self
            .status
            .parse::<PaymentStatus>()
            .map_err(DomainError::InternalError)?;

        Ok(Payment {
            id: self.id,
            payment_id: self.payment_id,
            user_id: self.user_id,
            amount: Money::from_paisa(self.amount),
            currency: self.currency,
            status,
            trx_id: self.trx_id,
            order_id: self.order_id,
            cart: self.cart.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            failed_at: self.failed_at,
            cancelled_at: self.cancelled_at,
            failure_reason: self.failure_reason,
            cancel_reason: self.cancel_reason,
        })
    }
}

/// Database row for carts
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    items: Json<Vec<CartItem>>,
    total: i64,
    reseller_id: Option<Uuid>,
}

impl CartRow {
    fn into_snapshot(self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.0,
            total: Money::from_paisa(self.total),
            reseller_id: self.reseller_id,
        }
    }
}
