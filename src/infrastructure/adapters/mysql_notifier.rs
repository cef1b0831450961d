use crate::domain::errors::DomainResult;
use crate::domain::events::{DomainEvent, OrderPlaced};
use crate::ports::notification_port::NotificationPort;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Writes order notifications as rows; delivery to devices is handled by
/// a separate consumer.
#[derive(Clone)]
pub struct MySqlNotifier {
    pool: Arc<Pool<MySql>>,
}

impl MySqlNotifier {
    pub fn new(pool: Arc<Pool<MySql>>) -> Self {
        Self { pool }
    }

    async fn insert(&self, user_id: Uuid, message: &str, order_id: Uuid) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, kind, order_id, created_at)
            VALUES (?, ?, ?, ?, 'order', ?, ?)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind("New Order Received")
        .bind(message)
        .bind(order_id)
        .bind(Utc::now())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationPort for MySqlNotifier {
    /// Admins always hear about a sale; the reseller only when the order
    /// came through their storefront
    async fn order_placed(&self, event: &OrderPlaced) -> DomainResult<()> {
        let admins: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE role = 'admin'")
            .fetch_all(self.pool.as_ref())
            .await?;

        for admin in admins {
            self.insert(
                admin,
                &format!(
                    "Order #{} has been placed for {}.",
                    event.order_number, event.total
                ),
                event.order_id,
            )
            .await?;
        }

        if let Some(reseller_id) = event.reseller_id {
            self.insert(
                reseller_id,
                &format!(
                    "You have received a new order #{} worth {}.",
                    event.order_number, event.total
                ),
                event.order_id,
            )
            .await?;
        }

        debug!(
            "{} notifications written for {}",
            event.event_type(),
            event.order_number
        );
        Ok(())
    }
}
