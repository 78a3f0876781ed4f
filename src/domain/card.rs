use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Validation problem reported by a card input while the user types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInputError {
    pub code: String,
    pub message: String,
}

/// Notification emitted by a card input whenever its content changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardChange {
    /// Whether the input holds a complete, valid card.
    pub complete: bool,
    pub error: Option<CardInputError>,
}

pub type CardChangeListener = Box<dyn Fn(&CardChange) + Send + Sync>;

/// A card-entry widget created by a payment provider.
pub trait CardInput: Send + Sync {
    /// Attaches the input to the element identified by `element_id`.
    fn mount(&self, element_id: &str) -> Result<()>;

    /// Registers a listener invoked on every change of the input.
    fn on_change(&self, listener: CardChangeListener);

    /// Provider-specific reference placed under `card` when confirming.
    fn handle(&self) -> Value;
}

pub type CardInputHandle = Arc<dyn CardInput>;

/// Where card validation errors are shown to the user.
pub trait ErrorDisplay: Send + Sync {
    fn show(&self, message: &str);
    fn clear(&self);
}
