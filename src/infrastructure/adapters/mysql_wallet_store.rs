use crate::domain::entities::TransactionKind;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Money, PaymentStatus};
use crate::domain::WalletTransaction;
use crate::ports::wallet_store_port::WalletStorePort;
use async_trait::async_trait;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// MySQL wallet ledger: top-up transactions plus the balance column on
/// users.
#[derive(Clone)]
pub struct MySqlWalletStore {
    pool: Arc<Pool<MySql>>,
}

impl MySqlWalletStore {
    pub fn new(pool: Arc<Pool<MySql>>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletStorePort for MySqlWalletStore {
    /// Saves a freshly initiated pending top-up
    async fn insert_transaction(&self, txn: &WalletTransaction) -> DomainResult<()> {
        let query = r#"
            INSERT INTO wallet_transactions (
                id, user_id, payment_id, kind, amount, balance,
                description, status, trx_id, created_at, updated_at,
                completed_at, failed_at, cancelled_at,
                failure_reason, cancel_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(txn.id)
            .bind(txn.user_id)
            .bind(&txn.payment_id)
            .bind(txn.kind.to_string())
            .bind(txn.amount.to_paisa())
            .bind(txn.balance.map(|b| b.to_paisa()))
            .bind(&txn.description)
            .bind(txn.status.to_string())
            .bind(&txn.trx_id)
            .bind(txn.created_at)
            .bind(txn.updated_at)
            .bind(txn.completed_at)
            .bind(txn.failed_at)
            .bind(txn.cancelled_at)
            .bind(&txn.failure_reason)
            .bind(&txn.cancel_reason)
            .execute(self.pool.as_ref())
            .await?;

        debug!("Wallet transaction saved: {}", txn.payment_id);
        Ok(())
    }

    /// Fetches a top-up by the gateway-assigned id
    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> DomainResult<Option<WalletTransaction>> {
        let query = r#"
            SELECT id, user_id, payment_id, kind, amount, balance,
                   description, status, trx_id, created_at, updated_at,
                   completed_at, failed_at, cancelled_at,
                   failure_reason, cancel_reason
            FROM wallet_transactions
            WHERE payment_id = ?
        "#;

        let result = sqlx::query_as::<_, WalletTransactionRow>(query)
            .bind(payment_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        result.map(|row| row.into_transaction()).transpose()
    }

    /// One transaction: conditional completion, balance credit, balance
    /// stamp. The conditional update is what makes duplicate deliveries
    /// credit exactly once.
    async fn complete_topup(
        &self,
        txn: &WalletTransaction,
        trx_id: &str,
    ) -> DomainResult<Money> {
        let mut tx = self.pool.begin().await?;

        let mut completed = txn.clone();
        completed.mark_completed(trx_id.to_string())?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE wallet_transactions
            SET status = ?, trx_id = ?, completed_at = ?, updated_at = ?
            WHERE payment_id = ? AND status = 'pending'
            "#,
        )
        .bind(completed.status.to_string())
        .bind(&completed.trx_id)
        .bind(completed.completed_at)
        .bind(completed.updated_at)
        .bind(&completed.payment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            tx.rollback().await?;
            return Err(DomainError::AlreadyProcessed(txn.payment_id.clone()));
        }

        let credited = sqlx::query(
            "UPDATE users SET wallet_balance = wallet_balance + ? WHERE id = ?",
        )
        .bind(txn.amount.to_paisa())
        .bind(txn.user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if credited == 0 {
            tx.rollback().await?;
            return Err(DomainError::UserNotFound(txn.user_id.to_string()));
        }

        let balance: i64 = sqlx::query_scalar("SELECT wallet_balance FROM users WHERE id = ?")
            .bind(txn.user_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE wallet_transactions SET balance = ? WHERE payment_id = ?")
            .bind(balance)
            .bind(&txn.payment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            "Top-up completed: {} credited to user {}",
            txn.amount, txn.user_id
        );
        Ok(Money::from_paisa(balance))
    }

    /// Conditional terminal write; false when no longer pending
    async fn mark_failed(&self, txn: &WalletTransaction) -> DomainResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE wallet_transactions
            SET status = ?, failed_at = ?, cancelled_at = ?,
                failure_reason = ?, cancel_reason = ?, updated_at = ?
            WHERE payment_id = ? AND status = 'pending'
            "#,
        )
        .bind(txn.status.to_string())
        .bind(txn.failed_at)
        .bind(txn.cancelled_at)
        .bind(&txn.failure_reason)
        .bind(&txn.cancel_reason)
        .bind(txn.updated_at)
        .bind(&txn.payment_id)
        .execute(self.pool.as_ref())
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

/// Database row for wallet transactions
#[derive(Debug, sqlx::FromRow)]
struct WalletTransactionRow {
    id: Uuid,
    user_id: Uuid,
    payment_id: String,
    kind: String,
    amount: i64,
    balance: Option<i64>,
    description: String,
    status: String,
    trx_id: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    failed_at: Option<chrono::DateTime<chrono::Utc>>,
    cancelled_at: Option<chrono::DateTime<chrono::Utc>>,
    failure_reason: Option<String>,
    cancel_reason: Option<String>,
}

impl WalletTransactionRow {
    fn into_transaction(self) -> DomainResult<WalletTransaction> {
        let status = self
            .status
            .parse::<PaymentStatus>()
            .map_err(DomainError::InternalError)?;

        let kind = match self.kind.as_str() {
            "credit" => TransactionKind::Credit,
            "debit" => TransactionKind::Debit,
            other => {
                return Err(DomainError::InternalError(format!(
                    "unknown transaction kind: {}",
                    other
                )))
            }
        };

        Ok(WalletTransaction {
            id: self.id,
            user_id: self.user_id,
            payment_id: self.payment_id,
            kind,
            amount: Money::from_paisa(self.amount),
            balance: self.balance.map(Money::from_paisa),
            description: self.description,
            status,
            trx_id: self.trx_id,
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
