use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Order lifecycle. All transitions go through [`OrderStatus::can_transition_to`];
/// endpoints never compare raw status strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    PendingPayment,
    WaitingTransferProof,
    PaymentReview,
    Processed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::WaitingTransferProof => "WAITING_TRANSFER_PROOF",
            OrderStatus::PaymentReview => "PAYMENT_REVIEW",
            OrderStatus::Processed => "PROCESSED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(OrderStatus::Pending),
            "PENDING_PAYMENT" => Some(OrderStatus::PendingPayment),
            "WAITING_TRANSFER_PROOF" => Some(OrderStatus::WaitingTransferProof),
            "PAYMENT_REVIEW" => Some(OrderStatus::PaymentReview),
            "PROCESSED" => Some(OrderStatus::Processed),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if next == Cancelled {
            return !self.is_terminal();
        }
        match self {
            Pending => matches!(next, PendingPayment | WaitingTransferProof),
            PendingPayment => matches!(next, Processed),
            WaitingTransferProof => matches!(next, PaymentReview),
            PaymentReview => matches!(next, Processed),
            Processed => matches!(next, Delivered),
            Delivered | Cancelled => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub on_sale: bool,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Unit price charged at purchase time.
    pub fn effective_price(&self) -> i64 {
        if self.on_sale {
            self.sale_price.unwrap_or(self.price)
        } else {
            self.price
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color: String,
    pub size: String,
    pub stock: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,
    pub postal_code: Option<String>,
    pub status: OrderStatus,
    pub total: i64,
    pub payment_method: String,
    pub tracking_number: Option<String>,
    pub last_tracking_event: Option<String>,
    pub transfer_sender: Option<String>,
    pub transfer_tx_id: Option<String>,
    pub transfer_sent_at: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
    pub color: Option<String>,
    pub size: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingOption {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub estimated_days: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VacationPeriod {
    pub id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            Pending,
            PendingPayment,
            WaitingTransferProof,
            PaymentReview,
            Processed,
            Delivered,
            Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }

    #[test]
    fn happy_path_transitions_allowed() {
        assert!(Pending.can_transition_to(PendingPayment));
        assert!(PendingPayment.can_transition_to(Processed));
        assert!(Processed.can_transition_to(Delivered));
    }

    #[test]
    fn bank_transfer_path_transitions_allowed() {
        assert!(Pending.can_transition_to(WaitingTransferProof));
        assert!(WaitingTransferProof.can_transition_to(PaymentReview));
        assert!(PaymentReview.can_transition_to(Processed));
    }

    #[test]
    fn cancel_allowed_from_every_non_terminal_state() {
        for status in [
            Pending,
            PendingPayment,
            WaitingTransferProof,
            PaymentReview,
            Processed,
        ] {
            assert!(status.can_transition_to(Cancelled), "{status:?}");
        }
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(!Pending.can_transition_to(Processed));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!WaitingTransferProof.can_transition_to(Processed));
        assert!(!PendingPayment.can_transition_to(Delivered));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for next in [
            Pending,
            PendingPayment,
            WaitingTransferProof,
            PaymentReview,
            Processed,
            Delivered,
            Cancelled,
        ] {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }
}
