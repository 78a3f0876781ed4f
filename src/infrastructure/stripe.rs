//! Provider adapter speaking the Stripe REST API with a publishable key.
//!
//! Confirmation goes through `POST /v1/payment_intents/{id}/confirm`, which
//! accepts the intent's client secret in place of a secret key. Card entry is
//! headless: the card input holds an already tokenized payment method
//! (`pm_...` or `tok_...`) instead of raw card numbers.

use crate::config::{CheckoutConfig, parse_base_url};
use crate::domain::card::{CardChange, CardChangeListener, CardInput, CardInputError, CardInputHandle};
use crate::domain::ports::PaymentProvider;
use crate::domain::provider::{
    ConfirmationOutcome, ConfirmedIntent, DEFAULT_PROVIDER_FAILURE, ProviderFailure,
};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SECRET_SEPARATOR: &str = "_secret_";

/// Card input holding a tokenized payment method reference.
#[derive(Default)]
pub struct HeadlessCardInput {
    payment_method: RwLock<Option<String>>,
    mounted_at: RwLock<Option<String>>,
    listeners: Mutex<Vec<CardChangeListener>>,
}

impl HeadlessCardInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element the input is currently mounted at, if any.
    pub fn mounted_at(&self) -> Option<String> {
        self.mounted_at.read().clone()
    }

    /// Replaces the entered value and notifies every listener.
    ///
    /// Invalid values are not kept: the card handle becomes `null` until a
    /// valid reference is entered.
    pub fn update(&self, value: &str) -> CardChange {
        let value = value.trim();
        let change = validate_card_reference(value);
        *self.payment_method.write() = change.complete.then(|| value.to_string());

        for listener in self.listeners.lock().iter() {
            listener(&change);
        }
        change
    }
}

fn validate_card_reference(value: &str) -> CardChange {
    let error = if value.is_empty() {
        Some(CardInputError {
            code: "incomplete_number".to_string(),
            message: "Your card number is incomplete.".to_string(),
        })
    } else if !(value.starts_with("pm_") || value.starts_with("tok_")) {
        Some(CardInputError {
            code: "invalid_number".to_string(),
            message: "Your card number is invalid.".to_string(),
        })
    } else {
        None
    };

    CardChange {
        complete: error.is_none(),
        error,
    }
}

impl CardInput for HeadlessCardInput {
    fn mount(&self, element_id: &str) -> Result<()> {
        let element_id = element_id.trim_start_matches('#');
        if element_id.is_empty() {
            return Err(CheckoutError::Validation(
                "Element id is required to mount the card input".to_string(),
            ));
        }
        *self.mounted_at.write() = Some(element_id.to_string());
        debug!(element_id, "Mounted card input");
        Ok(())
    }

    fn on_change(&self, listener: CardChangeListener) {
        self.listeners.lock().push(listener);
    }

    fn handle(&self) -> Value {
        match self.payment_method.read().as_ref() {
            Some(reference) => Value::String(reference.clone()),
            None => Value::Null,
        }
    }
}

/// Elements factory. Keeps the card input it created so the host
/// application can feed it values after handing the provider away.
#[derive(Default)]
pub struct StripeElements {
    card: RwLock<Option<Arc<HeadlessCardInput>>>,
}

impl StripeElements {
    pub fn create_card(&self) -> Arc<HeadlessCardInput> {
        let card = Arc::new(HeadlessCardInput::new());
        *self.card.write() = Some(card.clone());
        card
    }

    /// The most recently created card input.
    pub fn card(&self) -> Option<Arc<HeadlessCardInput>> {
        self.card.read().clone()
    }
}

#[derive(Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    decline_code: Option<String>,
}

pub struct StripeProvider {
    client: Client,
    api_base: Url,
    publishable_key: String,
    elements: Arc<StripeElements>,
}

impl std::fmt::Debug for StripeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeProvider")
            .field("api_base", &self.api_base.as_str())
            .field("has_publishable_key", &!self.publishable_key.is_empty())
            .finish()
    }
}

impl StripeProvider {
    /// Creates a provider client from a publishable key.
    ///
    /// The key is only checked when a payment is confirmed, so a provider
    /// can be built for sessions that never pay.
    pub fn new(publishable_key: impl Into<String>, api_base: &str, timeout: Duration) -> Result<Self> {
        let publishable_key = publishable_key.into();
        let api_base = parse_base_url("provider", api_base)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("card-checkout/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_base,
            publishable_key,
            elements: Arc::new(StripeElements::default()),
        })
    }

    pub fn from_config(config: &CheckoutConfig) -> Result<Self> {
        Self::new(
            config.publishable_key.clone(),
            &config.provider_url,
            config.timeout(),
        )
    }

    pub fn elements(&self) -> Arc<StripeElements> {
        self.elements.clone()
    }

    fn confirm_url(&self, intent_id: &str) -> Result<Url> {
        let mut url = self
            .api_base
            .join("v1/payment_intents/")
            .map_err(|e| CheckoutError::Configuration(format!("Failed to construct URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CheckoutError::Configuration("Provider URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(intent_id)
            .push("confirm");
        Ok(url)
    }
}

/// Extracts the intent id (`pi_123`) from its client secret (`pi_123_secret_abc`).
pub fn intent_id_from_client_secret(client_secret: &str) -> Result<&str> {
    match client_secret.split_once(SECRET_SEPARATOR) {
        Some((id, secret)) if !id.is_empty() && !secret.is_empty() => Ok(id),
        _ => Err(CheckoutError::Validation(
            "Client secret is malformed".to_string(),
        )),
    }
}

/// Flattens a JSON value into bracketed form fields (`a[b][0]=c`).
fn flatten_form_value(prefix: String, value: Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push((prefix, s)),
        Value::Bool(b) => out.push((prefix, b.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                flatten_form_value(format!("{}[{}]", prefix, index), item, out);
            }
        }
        Value::Object(fields) => {
            for (key, item) in fields {
                flatten_form_value(format!("{}[{}]", prefix, key), item, out);
            }
        }
    }
}

fn confirmation_form(client_secret: &str, mut payment_method: Map<String, Value>) -> Vec<(String, String)> {
    let mut form = vec![("client_secret".to_string(), client_secret.to_string())];

    match payment_method.remove("card") {
        Some(Value::String(reference)) => form.push(("payment_method".to_string(), reference)),
        Some(other) => {
            flatten_form_value("payment_method_data[card]".to_string(), other, &mut form)
        }
        None => {}
    }
    for (key, value) in payment_method {
        flatten_form_value(format!("payment_method_data[{}]", key), value, &mut form);
    }
    form
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn create_card_input(&self) -> Result<CardInputHandle> {
        Ok(self.elements.create_card())
    }

    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method: Map<String, Value>,
    ) -> Result<ConfirmationOutcome> {
        if self.publishable_key.trim().is_empty() {
            return Err(CheckoutError::Configuration(
                "A publishable key is required to confirm payments".to_string(),
            ));
        }
        let intent_id = intent_id_from_client_secret(client_secret)?;
        let url = self.confirm_url(intent_id)?;

        debug!(url = %url, intent_id, "Confirming card payment with provider");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.publishable_key)
            .form(&confirmation_form(client_secret, payment_method))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let intent = response.json::<ConfirmedIntent>().await.map_err(|e| {
                CheckoutError::InvalidResponse(format!("Invalid confirmed intent: {}", e))
            })?;
            info!(intent_id = %intent.id, status = ?intent.status, "Provider confirmed payment");
            return Ok(Ok(intent));
        }

        let failure = match response.json::<StripeErrorEnvelope>().await {
            Ok(envelope) => ProviderFailure {
                message: envelope
                    .error
                    .message
                    .unwrap_or_else(|| DEFAULT_PROVIDER_FAILURE.to_string()),
                code: envelope.error.code,
                decline_code: envelope.error.decline_code,
            },
            Err(_) => ProviderFailure::new(DEFAULT_PROVIDER_FAILURE),
        };
        warn!(
            status = %status,
            intent_id,
            code = ?failure.code,
            error = %failure.message,
            "Provider rejected card payment"
        );
        Ok(Err(failure))
    }
}
