use crate::domain::payment::BackendConfirmation;
use crate::domain::provider::ConfirmedIntent;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Outcome of a full checkout run.
///
/// Serializes as `{"success": true, "paymentIntent": .., "backendResult": ..}`
/// or `{"success": false, "error": ".."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    Succeeded {
        payment_intent: ConfirmedIntent,
        backend_result: BackendConfirmation,
    },
    Failed {
        error: String,
    },
}

impl FlowResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FlowResult::Succeeded { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FlowResult::Succeeded { .. } => None,
            FlowResult::Failed { error } => Some(error),
        }
    }
}

impl Serialize for FlowResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FlowResult::Succeeded {
                payment_intent,
                backend_result,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("paymentIntent", payment_intent)?;
                map.serialize_entry("backendResult", backend_result)?;
                map.end()
            }
            FlowResult::Failed { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}
