use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    /// The backend answered with a non-success status.
    ///
    /// Displays only the message so callers see exactly what the backend
    /// reported (or the per-call fallback).
    #[error("{message}")]
    BackendRequest { status: u16, message: String },
    /// The provider rejected the card payment confirmation.
    #[error("{0}")]
    ProviderConfirmation(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Timed out waiting for {step}")]
    Timeout { step: &'static str },
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
