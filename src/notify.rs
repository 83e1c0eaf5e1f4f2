//! Notification rows for order lifecycle events.
//!
//! Callers treat this as fire-and-forget: a failed insert is logged with
//! `tracing::warn!` and never converted into a caller-visible error.

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};
use uuid::Uuid;

use crate::entity::notifications::ActiveModel as NotificationActive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Placed,
    Shipped,
    Delivered,
}

impl OrderEvent {
    pub fn message(&self, order_code: &str) -> String {
        match self {
            OrderEvent::Placed => {
                format!("Your order {order_code} has been placed successfully.")
            }
            OrderEvent::Shipped => format!("Good news! Order {order_code} is on the way."),
            OrderEvent::Delivered => {
                format!("Your order {order_code} has been delivered successfully.")
            }
        }
    }
}

pub async fn notify_order_event<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    order_code: &str,
    event: OrderEvent,
) -> Result<(), DbErr> {
    NotificationActive {
        id: NotSet,
        user_id: Set(user_id),
        title: Set("Order Update".to_string()),
        message: Set(event.message(order_code)),
        kind: Set("order".to_string()),
        is_read: Set(false),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::OrderEvent;

    #[test]
    fn event_messages_carry_the_order_code() {
        let code = "ORD-2026-K1A2B3C4";
        assert!(OrderEvent::Placed.message(code).contains(code));
        assert!(OrderEvent::Shipped.message(code).starts_with("Good news!"));
        assert!(OrderEvent::Delivered.message(code).ends_with("delivered successfully."));
    }
}
