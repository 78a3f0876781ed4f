use crate::config::{CheckoutConfig, parse_base_url};
use crate::domain::payment::{
    BackendConfirmation, ConfirmPaymentRequest, PaymentId, PaymentIntentRequest,
    PaymentIntentResponse, PaymentRecord, RefundRequest, RefundResponse,
};
use crate::domain::ports::PaymentBackend;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const CREATE_PAYMENT_INTENT_PATH: &str = "/api/payments/create-payment-intent/";
pub const CONFIRM_PAYMENT_PATH: &str = "/api/payments/confirm-payment/";
pub const PAYMENTS_PATH: &str = "/api/payments/payments/";
pub const CREATE_REFUND_PATH: &str = "/api/payments/create-refund/";

pub const CREATE_INTENT_FAILED: &str = "Failed to create payment intent";
pub const CONFIRM_PAYMENT_FAILED: &str = "Failed to confirm payment";
pub const HISTORY_FAILED: &str = "Failed to fetch payment history";
pub const DETAILS_FAILED: &str = "Failed to fetch payment details";
pub const REFUND_FAILED: &str = "Failed to process refund";

/// How a non-success response is turned into an error message.
#[derive(Debug, Clone, Copy)]
enum FailureMessage {
    /// Use the body's `error` string, or the fallback when there is none.
    FromBody(&'static str),
    /// Always use the fixed message; the body is not read.
    Fixed(&'static str),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<Value>,
}

/// JSON client for the backend payment API.
#[derive(Clone)]
pub struct HttpPaymentBackend {
    client: Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpPaymentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPaymentBackend")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpPaymentBackend {
    /// Creates a client for the backend at `base_url`.
    ///
    /// `timeout` bounds every request end to end.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url("backend", base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("card-checkout/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        debug!(base_url = %base_url, timeout_ms = timeout.as_millis() as u64, "Created backend client");
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &CheckoutConfig) -> Result<Self> {
        Self::new(&config.backend_url, config.timeout())
    }

    /// Joins an endpoint path beneath the base URL, keeping its path prefix.
    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| CheckoutError::Configuration(format!("Failed to construct URL: {}", e)))
    }

    /// URL of a single payment; the id is escaped as one path segment.
    fn payment_url(&self, payment_id: &PaymentId) -> Result<Url> {
        let mut url = self.url(PAYMENTS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| CheckoutError::Configuration("Backend URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(payment_id.as_str())
            .push("");
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: Option<&str>,
        failure: FailureMessage,
    ) -> Result<T> {
        if token.is_none() {
            warn!("No access token available, sending empty bearer credentials");
        }

        let response = request.bearer_auth(token.unwrap_or_default()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = match failure {
                FailureMessage::Fixed(message) => message.to_string(),
                FailureMessage::FromBody(fallback) => match response.json::<ErrorBody>().await {
                    Ok(ErrorBody {
                        error: Some(Value::String(message)),
                    }) if !message.is_empty() => message,
                    _ => fallback.to_string(),
                },
            };
            error!(status = %status, error = %message, "Backend request failed");
            return Err(CheckoutError::BackendRequest {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CheckoutError::InvalidResponse(format!("Invalid backend response: {}", e)))
    }
}

#[async_trait]
impl PaymentBackend for HttpPaymentBackend {
    async fn create_payment_intent(
        &self,
        token: Option<&str>,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntentResponse> {
        let url = self.url(CREATE_PAYMENT_INTENT_PATH)?;
        debug!(url = %url, order_id = %request.order_id, "Creating payment intent");
        self.send(
            self.client.post(url).json(request),
            token,
            FailureMessage::FromBody(CREATE_INTENT_FAILED),
        )
        .await
    }

    async fn confirm_payment(
        &self,
        token: Option<&str>,
        request: &ConfirmPaymentRequest,
    ) -> Result<BackendConfirmation> {
        let url = self.url(CONFIRM_PAYMENT_PATH)?;
        debug!(url = %url, payment_intent_id = %request.payment_intent_id, "Confirming payment on backend");
        self.send(
            self.client.post(url).json(request),
            token,
            FailureMessage::FromBody(CONFIRM_PAYMENT_FAILED),
        )
        .await
    }

    async fn payment_history(&self, token: Option<&str>) -> Result<Vec<PaymentRecord>> {
        let url = self.url(PAYMENTS_PATH)?;
        debug!(url = %url, "Fetching payment history");
        self.send(self.client.get(url), token, FailureMessage::Fixed(HISTORY_FAILED))
            .await
    }

    async fn payment_details(
        &self,
        token: Option<&str>,
        payment_id: &PaymentId,
    ) -> Result<PaymentRecord> {
        let url = self.payment_url(payment_id)?;
        debug!(url = %url, "Fetching payment details");
        self.send(self.client.get(url), token, FailureMessage::Fixed(DETAILS_FAILED))
            .await
    }

    async fn create_refund(
        &self,
        token: Option<&str>,
        request: &RefundRequest,
    ) -> Result<RefundResponse> {
        let url = self.url(CREATE_REFUND_PATH)?;
        debug!(url = %url, payment_id = %request.payment_id, amount = %request.amount, "Requesting refund");
        self.send(
            self.client.post(url).json(request),
            token,
            FailureMessage::FromBody(REFUND_FAILED),
        )
        .await
    }
}
