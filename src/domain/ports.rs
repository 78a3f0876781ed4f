use super::card::CardInputHandle;
use super::payment::{
    BackendConfirmation, ConfirmPaymentRequest, PaymentId, PaymentIntentRequest,
    PaymentIntentResponse, PaymentRecord, RefundRequest, RefundResponse,
};
use super::provider::ConfirmationOutcome;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Client side of the card payment provider (client + elements factory).
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a fresh card input. The caller decides where to mount it.
    fn create_card_input(&self) -> Result<CardInputHandle>;

    /// Confirms a card payment for the intent behind `client_secret`.
    ///
    /// The outer `Result` covers failures to reach the provider; the inner
    /// one is the provider's own verdict.
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method: Map<String, Value>,
    ) -> Result<ConfirmationOutcome>;
}

/// The backend payment API. Every call carries the caller's bearer token.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn create_payment_intent(
        &self,
        token: Option<&str>,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntentResponse>;
    async fn confirm_payment(
        &self,
        token: Option<&str>,
        request: &ConfirmPaymentRequest,
    ) -> Result<BackendConfirmation>;
    async fn payment_history(&self, token: Option<&str>) -> Result<Vec<PaymentRecord>>;
    async fn payment_details(
        &self,
        token: Option<&str>,
        payment_id: &PaymentId,
    ) -> Result<PaymentRecord>;
    async fn create_refund(
        &self,
        token: Option<&str>,
        request: &RefundRequest,
    ) -> Result<RefundResponse>;
}

/// Key-value store holding the caller's credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

pub type ProviderBox = Box<dyn PaymentProvider>;
pub type BackendBox = Box<dyn PaymentBackend>;
pub type CredentialStoreBox = Box<dyn CredentialStore>;
