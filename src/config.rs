use crate::error::{CheckoutError, Result};
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROVIDER_URL: &str = "https://api.stripe.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Connection settings for the backend and the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Base URL the `api/payments/...` paths are joined beneath.
    pub backend_url: String,
    /// Base URL of the provider's REST API.
    pub provider_url: String,
    /// Publishable (client-side) provider key.
    pub publishable_key: String,
    /// Upper bound for every network call and every checkout step.
    pub timeout_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            publishable_key: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl CheckoutConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backend_base_url(&self) -> Result<Url> {
        parse_base_url("backend", &self.backend_url)
    }

    pub fn provider_base_url(&self) -> Result<Url> {
        parse_base_url("provider", &self.provider_url)
    }

    /// Checks everything a checkout run needs before any request goes out.
    pub fn validate(&self) -> Result<()> {
        self.backend_base_url()?;
        self.provider_base_url()?;
        if self.timeout_ms == 0 {
            return Err(CheckoutError::Configuration(
                "Timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses a base URL so relative paths join beneath its path prefix.
pub(crate) fn parse_base_url(name: &str, raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| CheckoutError::Configuration(format!("Invalid {} URL '{}': {}", name, raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(CheckoutError::Configuration(format!(
            "Invalid {} URL '{}': not a base URL",
            name, raw
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
