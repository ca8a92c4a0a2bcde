//! Payment outcome events shared by the payment and adoption sides.

use serde::{Deserialize, Serialize};

/// Published when a payment referencing an adoption intent has settled.
pub const PAYMENT_SUCCESS: &str = "payment.success";

/// Published when a payment referencing an adoption intent has lapsed.
pub const PAYMENT_EXPIRED: &str = "payment.expired";

/// Wire body of both payment events: `{"reference_id": "<intent-id>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub reference_id: String,
}

impl PaymentEvent {
    pub fn new(reference_id: impl Into<String>) -> Self {
        Self {
            reference_id: reference_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let event = PaymentEvent::new("0b9f2c4e-6a57-4d5e-9a39-2b8f4c1d7e60");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"reference_id":"0b9f2c4e-6a57-4d5e-9a39-2b8f4c1d7e60"}"#
        );
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let event: PaymentEvent =
            serde_json::from_str(r#"{"reference_id":"abc","amount":50}"#).unwrap();
        assert_eq!(event.reference_id, "abc");
    }
}
