use crate::domain::money::Amount;
use crate::error::CheckoutError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Longest refund reason the backend accepts.
pub const MAX_REFUND_REASON_LEN: usize = 500;

/// Identifier of the order being paid for. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(value: impl Into<String>) -> Result<Self, CheckoutError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "Order ID is required".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a payment record on the backend.
///
/// The backend may send it as an integer or a string; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    pub fn new(value: impl Into<String>) -> Result<Self, CheckoutError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "Payment ID is required".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PaymentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or integer payment id, got {}",
                other
            ))),
        }
    }
}

/// Kind of payment method requested from the backend.
///
/// Kept open: the backend owns the list of accepted kinds, so unknown values
/// pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodKind(String);

impl PaymentMethodKind {
    pub const CARD: &'static str = "CARD";
    pub const BANK_TRANSFER: &'static str = "BANK_TRANSFER";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn card() -> Self {
        Self::new(Self::CARD)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PaymentMethodKind {
    fn default() -> Self {
        Self::card()
    }
}

/// Body of `POST /api/payments/create-payment-intent/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntentRequest {
    pub order_id: OrderId,
    pub payment_method: PaymentMethodKind,
}

/// Provider-ready intent returned by the backend.
///
/// Only the fields the flow consumes are typed; everything else the backend
/// sends is preserved in `extra` so the body round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /api/payments/confirm-payment/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
}

/// Backend acknowledgment of a confirmed payment. Backend-defined shape.
pub type BackendConfirmation = Value;

/// Backend acknowledgment of a refund. Backend-defined shape.
pub type RefundResponse = Value;

/// Body of `POST /api/payments/create-refund/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundRequest {
    pub payment_id: PaymentId,
    pub amount: Amount,
    pub reason: String,
}

impl RefundRequest {
    pub fn new(
        payment_id: PaymentId,
        amount: Amount,
        reason: impl Into<String>,
    ) -> Result<Self, CheckoutError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "Refund reason is required".to_string(),
            ));
        }
        if reason.chars().count() > MAX_REFUND_REASON_LEN {
            return Err(CheckoutError::Validation(format!(
                "Refund reason must be at most {} characters",
                MAX_REFUND_REASON_LEN
            )));
        }
        Ok(Self {
            payment_id,
            amount,
            reason,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Refunded,
    #[serde(untagged)]
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Succeeded => "SUCCEEDED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Other(s) => s,
        }
    }
}

/// A payment as listed by the backend's history and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    /// Kept exactly as the backend formats it (usually a decimal string).
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethodKind>,
    #[serde(default)]
    pub stripe_payment_intent_id: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
