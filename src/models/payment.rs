// src/models/payment.rs

use serde::{Deserialize, Serialize};

/// Event type that moves a certificate from unpaid to paid.
pub const PAYMENT_CAPTURED: &str = "payment.captured";

/// Order creation request sent to the payment provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    /// Amount in currency subunits.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// Correlation data echoed back by the provider on payment events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNotes {
    pub certificate_code: String,
}

/// Order object returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response for `POST /payment/create/{code}`.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    /// Public key the checkout widget needs.
    pub key_id: String,
    pub certificate_code: String,
    pub order: PaymentOrder,
}

/// Incoming webhook body. Only the fields this service acts on are modelled.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<PaymentEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEnvelope {
    pub entity: PaymentEntity,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,

    /// Provider sends an object, or an empty array when there are no notes.
    #[serde(default)]
    pub notes: serde_json::Value,
}

impl WebhookEvent {
    pub fn is_capture(&self) -> bool {
        self.event == PAYMENT_CAPTURED
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payload.payment.as_ref().map(|p| p.entity.id.as_str())
    }

    /// Certificate code carried in the payment notes.
    pub fn certificate_code(&self) -> Option<&str> {
        self.payload
            .payment
            .as_ref()?
            .entity
            .notes
            .get("certificate_code")?
            .as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_event_exposes_certificate_code() {
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "event": "payment.captured",
            "payload": {"payment": {"entity": {
                "id": "pay_1",
                "order_id": "order_1",
                "notes": {"certificate_code": "IPS-2025-000001"}
            }}}
        }))
        .unwrap();
        assert!(event.is_capture());
        assert_eq!(event.payment_id(), Some("pay_1"));
        assert_eq!(event.certificate_code(), Some("IPS-2025-000001"));
    }

    #[test]
    fn test_empty_notes_array_has_no_code() {
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "event": "payment.captured",
            "payload": {"payment": {"entity": {"id": "pay_2", "notes": []}}}
        }))
        .unwrap();
        assert_eq!(event.certificate_code(), None);
    }

    #[test]
    fn test_other_events_parse_without_payload() {
        let event: WebhookEvent =
            serde_json::from_value(serde_json::json!({"event": "order.paid"})).unwrap();
        assert!(!event.is_capture());
        assert_eq!(event.certificate_code(), None);
    }
}
