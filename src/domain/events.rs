use crate::domain::entities::Order;
use crate::domain::value_objects::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event trait
pub trait DomainEvent {
    fn event_type(&self) -> &'static str;
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Raised when a reconciled payment materializes an order. Consumed by the
/// notifier to tell admins and the owning reseller about the sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub reseller_id: Option<Uuid>,
    pub total: Money,
}

impl DomainEvent for OrderPlaced {
    fn event_type(&self) -> &'static str {
        "OrderPlaced"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl OrderPlaced {
    pub fn from_order(order: &Order) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            reseller_id: order.reseller_id,
            total: order.total,
        }
    }
}
