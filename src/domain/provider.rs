use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message used when the provider rejects a confirmation without saying why.
pub const DEFAULT_PROVIDER_FAILURE: &str = "Payment confirmation failed";

/// Additional payment-method fields supplied by the caller.
///
/// They are merged over the default `{card: <card handle>}` structure, so a
/// caller may also replace the card reference itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodData(Map<String, Value>);

impl PaymentMethodData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builds the `payment_method` structure sent to the provider.
    pub fn merged_over_card(self, card: Value) -> Map<String, Value> {
        let mut payment_method = Map::new();
        payment_method.insert("card".to_string(), card);
        payment_method.extend(self.0);
        payment_method
    }
}

impl From<Map<String, Value>> for PaymentMethodData {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Intent object returned by the provider after a successful confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedIntent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error reported by the provider while confirming a card payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decline_code: Option<String>,
}

impl ProviderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            decline_code: None,
        }
    }
}

/// What the provider answered to a confirmation attempt.
pub type ConfirmationOutcome = std::result::Result<ConfirmedIntent, ProviderFailure>;
