#![allow(dead_code)]

use async_trait::async_trait;
use card_checkout::domain::card::{CardChangeListener, CardInput, CardInputHandle};
use card_checkout::domain::payment::{
    BackendConfirmation, ConfirmPaymentRequest, PaymentId, PaymentIntentRequest,
    PaymentIntentResponse, PaymentRecord, RefundRequest, RefundResponse,
};
use card_checkout::domain::ports::{PaymentBackend, PaymentProvider};
use card_checkout::domain::provider::{ConfirmationOutcome, ConfirmedIntent, ProviderFailure};
use card_checkout::error::{CheckoutError, Result};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered log of every call made against the fakes, shared between them.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub fn backend_error(status: u16, message: &str) -> CheckoutError {
    CheckoutError::BackendRequest {
        status,
        message: message.to_string(),
    }
}

pub fn intent(client_secret: &str, id: &str) -> PaymentIntentResponse {
    serde_json::from_value(json!({"client_secret": client_secret, "id": id})).unwrap()
}

pub fn confirmed(id: &str, status: &str) -> ConfirmedIntent {
    serde_json::from_value(json!({"id": id, "status": status})).unwrap()
}

type Slot<T> = Arc<Mutex<Option<T>>>;

fn slot<T>() -> Slot<T> {
    Arc::new(Mutex::new(None))
}

/// Backend fake answering from canned results and logging the inputs it saw.
///
/// Clones share state, so a test can keep one and hand another to the
/// orchestrator.
#[derive(Clone)]
pub struct FakeBackend {
    pub log: CallLog,
    pub create_result: Slot<Result<PaymentIntentResponse>>,
    pub confirm_result: Slot<Result<BackendConfirmation>>,
    pub refund_result: Slot<Result<RefundResponse>>,
    pub tokens: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakeBackend {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            create_result: slot(),
            confirm_result: slot(),
            refund_result: slot(),
            tokens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn on_create(self, result: Result<PaymentIntentResponse>) -> Self {
        *self.create_result.lock().unwrap() = Some(result);
        self
    }

    pub fn on_confirm(self, result: Result<BackendConfirmation>) -> Self {
        *self.confirm_result.lock().unwrap() = Some(result);
        self
    }

    pub fn on_refund(self, result: Result<RefundResponse>) -> Self {
        *self.refund_result.lock().unwrap() = Some(result);
        self
    }

    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().unwrap().clone()
    }

    fn take<T>(slot: &Slot<Result<T>>, name: &str) -> Result<T> {
        slot.lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| panic!("{} called more than once or not configured", name))
    }
}

#[async_trait]
impl PaymentBackend for FakeBackend {
    async fn create_payment_intent(
        &self,
        token: Option<&str>,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntentResponse> {
        self.tokens.lock().unwrap().push(token.map(String::from));
        self.log.record(format!(
            "create:{}:{}",
            request.order_id,
            request.payment_method.as_str()
        ));
        FakeBackend::take(&self.create_result, "create_payment_intent")
    }

    async fn confirm_payment(
        &self,
        token: Option<&str>,
        request: &ConfirmPaymentRequest,
    ) -> Result<BackendConfirmation> {
        self.tokens.lock().unwrap().push(token.map(String::from));
        self.log
            .record(format!("backend-confirm:{}", request.payment_intent_id));
        FakeBackend::take(&self.confirm_result, "confirm_payment")
    }

    async fn payment_history(&self, token: Option<&str>) -> Result<Vec<PaymentRecord>> {
        self.tokens.lock().unwrap().push(token.map(String::from));
        self.log.record("history");
        Ok(Vec::new())
    }

    async fn payment_details(
        &self,
        token: Option<&str>,
        payment_id: &PaymentId,
    ) -> Result<PaymentRecord> {
        self.tokens.lock().unwrap().push(token.map(String::from));
        self.log.record(format!("details:{}", payment_id));
        Ok(serde_json::from_value(json!({"id": payment_id.as_str()})).unwrap())
    }

    async fn create_refund(
        &self,
        token: Option<&str>,
        request: &RefundRequest,
    ) -> Result<RefundResponse> {
        self.tokens.lock().unwrap().push(token.map(String::from));
        self.log.record(format!(
            "refund:{}:{}:{}",
            request.payment_id, request.amount, request.reason
        ));
        FakeBackend::take(&self.refund_result, "create_refund")
    }
}

pub struct FakeCard;

impl CardInput for FakeCard {
    fn mount(&self, _element_id: &str) -> Result<()> {
        Ok(())
    }

    fn on_change(&self, _listener: CardChangeListener) {}

    fn handle(&self) -> Value {
        json!("pm_fake")
    }
}

/// Provider fake with a canned confirmation outcome and optional delay.
#[derive(Clone)]
pub struct FakeProvider {
    pub log: CallLog,
    pub outcome: Slot<ConfirmationOutcome>,
    pub delay: Option<Duration>,
    pub seen: Slot<(String, Map<String, Value>)>,
}

impl FakeProvider {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            outcome: slot(),
            delay: None,
            seen: slot(),
        }
    }

    pub fn succeeding(self, intent: ConfirmedIntent) -> Self {
        *self.outcome.lock().unwrap() = Some(Ok(intent));
        self
    }

    pub fn failing(self, message: &str) -> Self {
        *self.outcome.lock().unwrap() = Some(Err(ProviderFailure::new(message)));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    fn create_card_input(&self) -> Result<CardInputHandle> {
        Ok(Arc::new(FakeCard))
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method: Map<String, Value>,
    ) -> Result<ConfirmationOutcome> {
        self.log
            .record(format!("provider-confirm:{}", client_secret));
        *self.seen.lock().unwrap() = Some((client_secret.to_string(), payment_method));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .outcome
            .lock()
            .unwrap()
            .take()
            .expect("confirm_card_payment called more than once or not configured"))
    }
}
