use crate::domain::card::{CardChange, CardInputHandle, ErrorDisplay};
use crate::domain::flow::FlowResult;
use crate::domain::payment::{
    BackendConfirmation, ConfirmPaymentRequest, OrderId, PaymentId, PaymentIntentRequest,
    PaymentIntentResponse, PaymentMethodKind, PaymentRecord, RefundRequest, RefundResponse,
};
use crate::domain::ports::{BackendBox, CredentialStoreBox, ProviderBox};
use crate::domain::money::Amount;
use crate::domain::provider::{ConfirmedIntent, PaymentMethodData};
use crate::error::{CheckoutError, Result};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Credential store key holding the caller's bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives a card checkout between the payment provider and the backend.
///
/// `PaymentOrchestrator` owns the provider client, the backend client and the
/// card input it mounted. Each checkout runs its steps strictly in order:
/// create the intent on the backend, confirm it with the provider, then
/// confirm it on the backend.
pub struct PaymentOrchestrator {
    provider: ProviderBox,
    backend: BackendBox,
    credentials: CredentialStoreBox,
    card: RwLock<Option<CardInputHandle>>,
    step_timeout: Duration,
}

impl PaymentOrchestrator {
    /// Creates a new `PaymentOrchestrator` instance.
    ///
    /// # Arguments
    ///
    /// * `provider` - The payment provider client.
    /// * `backend` - The backend payment API.
    /// * `credentials` - Where the bearer token is looked up on every call.
    pub fn new(
        provider: ProviderBox,
        backend: BackendBox,
        credentials: CredentialStoreBox,
    ) -> Self {
        Self {
            provider,
            backend,
            credentials,
            card: RwLock::new(None),
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Bounds every network step by `timeout`.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Creates a card input, mounts it at `element_id` and routes its
    /// validation errors to `display`.
    ///
    /// Calling this again replaces the previously stored card input.
    pub fn initialize_card(&self, element_id: &str, display: Arc<dyn ErrorDisplay>) -> Result<()> {
        let card = self.provider.create_card_input()?;
        card.mount(element_id)?;
        card.on_change(Box::new(move |change: &CardChange| match &change.error {
            Some(error) => display.show(&error.message),
            None => display.clear(),
        }));

        if self.card.write().replace(card).is_some() {
            debug!(element_id, "Replaced previously mounted card input");
        }
        info!(element_id, "Card input initialized");
        Ok(())
    }

    /// Asks the backend to create a payment intent for `order_id`.
    pub async fn create_payment_intent(
        &self,
        order_id: &str,
        payment_method: PaymentMethodKind,
    ) -> Result<PaymentIntentResponse> {
        let request = PaymentIntentRequest {
            order_id: OrderId::new(order_id)?,
            payment_method,
        };
        let token = self.access_token().await?;
        let intent = self
            .bounded(
                "payment intent creation",
                self.backend.create_payment_intent(token.as_deref(), &request),
            )
            .await?;
        info!(order_id = %request.order_id, intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    /// Confirms the card payment with the provider.
    ///
    /// `payment_method_data` is merged over `{card: <mounted card input>}`.
    pub async fn confirm_payment(
        &self,
        client_secret: &str,
        payment_method_data: PaymentMethodData,
    ) -> Result<ConfirmedIntent> {
        if client_secret.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "Client secret is required".to_string(),
            ));
        }

        let card = match self.card.read().as_ref() {
            Some(card) => card.handle(),
            None => {
                debug!("No card input initialized, confirming without one");
                Value::Null
            }
        };
        let payment_method = payment_method_data.merged_over_card(card);

        let outcome = self
            .bounded(
                "provider confirmation",
                self.provider.confirm_card_payment(client_secret, payment_method),
            )
            .await?;

        match outcome {
            Ok(intent) => {
                info!(intent_id = %intent.id, status = ?intent.status, "Payment confirmed with provider");
                Ok(intent)
            }
            Err(failure) => Err(CheckoutError::ProviderConfirmation(failure.message)),
        }
    }

    /// Tells the backend that the provider confirmed `payment_intent_id`.
    pub async fn confirm_payment_on_backend(
        &self,
        payment_intent_id: &str,
    ) -> Result<BackendConfirmation> {
        let request = ConfirmPaymentRequest {
            payment_intent_id: payment_intent_id.to_string(),
        };
        let token = self.access_token().await?;
        let confirmation = self
            .bounded(
                "backend confirmation",
                self.backend.confirm_payment(token.as_deref(), &request),
            )
            .await?;
        info!(payment_intent_id, "Payment confirmed on backend");
        Ok(confirmation)
    }

    /// Runs the whole checkout for `order_id`.
    ///
    /// Never fails: any error from any step ends the run and is reported as
    /// `FlowResult::Failed` with that step's message.
    pub async fn process_payment(
        &self,
        order_id: &str,
        payment_method_data: PaymentMethodData,
    ) -> FlowResult {
        let intent = match self
            .create_payment_intent(order_id, PaymentMethodKind::default())
            .await
        {
            Ok(intent) => intent,
            Err(e) => return failed(order_id, "create", e),
        };

        let payment_intent = match self
            .confirm_payment(&intent.client_secret, payment_method_data)
            .await
        {
            Ok(payment_intent) => payment_intent,
            Err(e) => return failed(order_id, "provider-confirm", e),
        };

        match self.confirm_payment_on_backend(&payment_intent.id).await {
            Ok(backend_result) => FlowResult::Succeeded {
                payment_intent,
                backend_result,
            },
            Err(e) => {
                // The provider already accepted the payment at this point.
                error!(
                    order_id,
                    payment_intent_id = %payment_intent.id,
                    "Payment confirmed by provider but not recorded by backend, needs reconciliation"
                );
                failed(order_id, "backend-confirm", e)
            }
        }
    }

    pub async fn payment_history(&self) -> Result<Vec<PaymentRecord>> {
        let token = self.access_token().await?;
        self.bounded(
            "payment history",
            self.backend.payment_history(token.as_deref()),
        )
        .await
    }

    pub async fn payment_details(&self, payment_id: &str) -> Result<PaymentRecord> {
        let payment_id = PaymentId::new(payment_id)?;
        let token = self.access_token().await?;
        self.bounded(
            "payment details",
            self.backend.payment_details(token.as_deref(), &payment_id),
        )
        .await
    }

    pub async fn request_refund(
        &self,
        payment_id: &str,
        amount: Decimal,
        reason: &str,
    ) -> Result<RefundResponse> {
        let request = RefundRequest::new(PaymentId::new(payment_id)?, Amount::new(amount)?, reason)?;
        let token = self.access_token().await?;
        let refund = self
            .bounded(
                "refund request",
                self.backend.create_refund(token.as_deref(), &request),
            )
            .await?;
        info!(payment_id = %request.payment_id, amount = %request.amount, "Refund requested");
        Ok(refund)
    }

    /// Reads the bearer token fresh for every call.
    async fn access_token(&self) -> Result<Option<String>> {
        self.credentials.get(ACCESS_TOKEN_KEY).await
    }

    async fn bounded<T, F>(&self, step: &'static str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.step_timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                error!(step, timeout_ms = self.step_timeout.as_millis() as u64, "Checkout step timed out");
                Err(CheckoutError::Timeout { step })
            }
        }
    }
}

fn failed(order_id: &str, step: &str, error: CheckoutError) -> FlowResult {
    error!(order_id, step, error = %error, "Payment flow failed");
    FlowResult::Failed {
        error: error.to_string(),
    }
}
