mod common;

use card_checkout::application::orchestrator::{ACCESS_TOKEN_KEY, PaymentOrchestrator};
use card_checkout::domain::flow::FlowResult;
use card_checkout::domain::payment::PaymentMethodKind;
use card_checkout::domain::provider::PaymentMethodData;
use card_checkout::error::CheckoutError;
use card_checkout::infrastructure::in_memory::{InMemoryCredentialStore, InMemoryErrorDisplay};
use common::{CallLog, FakeBackend, FakeProvider, backend_error, confirmed, intent};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(
    provider: &FakeProvider,
    backend: &FakeBackend,
    credentials: &InMemoryCredentialStore,
) -> PaymentOrchestrator {
    PaymentOrchestrator::new(
        Box::new(provider.clone()),
        Box::new(backend.clone()),
        Box::new(credentials.clone()),
    )
}

#[tokio::test]
async fn test_successful_checkout() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone())
        .on_create(Ok(intent("cs_1", "pi_1")))
        .on_confirm(Ok(json!({"status": "confirmed"})));
    let provider = FakeProvider::new(log.clone()).succeeding(confirmed("pi_1", "succeeded"));
    let credentials = InMemoryCredentialStore::new();
    credentials.set(ACCESS_TOKEN_KEY, "tok_user").await;

    let engine = orchestrator(&provider, &backend, &credentials);
    let result = engine.process_payment("42", PaymentMethodData::new()).await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "success": true,
            "paymentIntent": {"id": "pi_1", "status": "succeeded"},
            "backendResult": {"status": "confirmed"}
        })
    );

    // Each step ran once, in order, fed by the previous step's output.
    assert_eq!(
        log.entries(),
        vec![
            "create:42:CARD".to_string(),
            "provider-confirm:cs_1".to_string(),
            "backend-confirm:pi_1".to_string(),
        ]
    );
    assert_eq!(
        backend.seen_tokens(),
        vec![Some("tok_user".to_string()), Some("tok_user".to_string())]
    );
}

#[tokio::test]
async fn test_create_intent_failure_stops_flow() {
    let log = CallLog::default();
    let backend =
        FakeBackend::new(log.clone()).on_create(Err(backend_error(400, "Order not found")));
    let provider = FakeProvider::new(log.clone());

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new());
    let result = engine.process_payment("999", PaymentMethodData::new()).await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"success": false, "error": "Order not found"})
    );
    assert_eq!(log.entries(), vec!["create:999:CARD".to_string()]);
}

#[tokio::test]
async fn test_provider_decline_skips_backend_confirm() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone()).on_create(Ok(intent("cs_1", "pi_1")));
    let provider = FakeProvider::new(log.clone()).failing("Card declined");

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new());
    let result = engine.process_payment("42", PaymentMethodData::new()).await;

    assert_eq!(
        result,
        FlowResult::Failed {
            error: "Card declined".to_string()
        }
    );
    assert_eq!(
        log.entries(),
        vec![
            "create:42:CARD".to_string(),
            "provider-confirm:cs_1".to_string()
        ]
    );
}

#[tokio::test]
async fn test_backend_confirm_failure_reports_failure() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone())
        .on_create(Ok(intent("cs_1", "pi_1")))
        .on_confirm(Err(backend_error(500, "Failed to confirm payment")));
    let provider = FakeProvider::new(log.clone()).succeeding(confirmed("pi_1", "succeeded"));

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new());
    let result = engine.process_payment("42", PaymentMethodData::new()).await;

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        json!({"success": false, "error": "Failed to confirm payment"})
    );
    assert!(value.get("paymentIntent").is_none());
    assert!(value.get("backendResult").is_none());
    assert_eq!(log.entries().len(), 3);
}

#[tokio::test]
async fn test_missing_token_is_passed_through() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone());
    let provider = FakeProvider::new(log);

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new());
    engine.payment_history().await.unwrap();

    assert_eq!(backend.seen_tokens(), vec![None]);
}

#[tokio::test]
async fn test_token_is_read_on_every_call() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone());
    let provider = FakeProvider::new(log);
    let credentials = InMemoryCredentialStore::new();

    let engine = orchestrator(&provider, &backend, &credentials);
    credentials.set(ACCESS_TOKEN_KEY, "tok_old").await;
    engine.payment_history().await.unwrap();
    credentials.set(ACCESS_TOKEN_KEY, "tok_new").await;
    engine.payment_details("pay_1").await.unwrap();

    assert_eq!(
        backend.seen_tokens(),
        vec![Some("tok_old".to_string()), Some("tok_new".to_string())]
    );
}

#[tokio::test]
async fn test_payment_method_data_overrides_card() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone())
        .on_create(Ok(intent("cs_1", "pi_1")))
        .on_confirm(Ok(json!({})));
    let provider = FakeProvider::new(log).succeeding(confirmed("pi_1", "succeeded"));

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new());
    engine
        .initialize_card("card-element", Arc::new(InMemoryErrorDisplay::new()))
        .unwrap();
    let result = engine
        .process_payment(
            "42",
            PaymentMethodData::new()
                .with("card", "pm_saved")
                .with("billing_details", json!({"name": "Ada"})),
        )
        .await;
    assert!(result.is_success());

    let (client_secret, payment_method) = provider.seen.lock().unwrap().clone().unwrap();
    assert_eq!(client_secret, "cs_1");
    assert_eq!(
        Value::Object(payment_method),
        json!({"card": "pm_saved", "billing_details": {"name": "Ada"}})
    );
}

#[tokio::test]
async fn test_create_payment_intent_with_other_kind() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone()).on_create(Ok(intent("cs_9", "pi_9")));
    let provider = FakeProvider::new(log.clone());

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new());
    let response = engine
        .create_payment_intent("7", PaymentMethodKind::new(PaymentMethodKind::BANK_TRANSFER))
        .await
        .unwrap();

    assert_eq!(response, intent("cs_9", "pi_9"));
    assert_eq!(log.entries(), vec!["create:7:BANK_TRANSFER".to_string()]);
}

#[tokio::test]
async fn test_refund_passes_body_through() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone()).on_refund(Ok(json!({"refund_id": "re_1"})));
    let provider = FakeProvider::new(log.clone());

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new());
    let refund = engine
        .request_refund("pay_1", dec!(500), "duplicate")
        .await
        .unwrap();

    assert_eq!(refund, json!({"refund_id": "re_1"}));
    assert_eq!(log.entries(), vec!["refund:pay_1:500:duplicate".to_string()]);
}

#[tokio::test]
async fn test_refund_failure_propagates() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone()).on_refund(Err(backend_error(
        400,
        "Refund amount cannot exceed payment amount",
    )));
    let provider = FakeProvider::new(log);

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new());
    let err = engine
        .request_refund("pay_1", dec!(10000), "duplicate")
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::BackendRequest { status: 400, .. }));
    assert_eq!(err.to_string(), "Refund amount cannot exceed payment amount");
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let log = CallLog::default();
    let backend = FakeBackend::new(log.clone()).on_create(Ok(intent("cs_1", "pi_1")));
    let provider = FakeProvider::new(log.clone())
        .succeeding(confirmed("pi_1", "succeeded"))
        .delayed(Duration::from_secs(10));

    let engine = orchestrator(&provider, &backend, &InMemoryCredentialStore::new())
        .with_step_timeout(Duration::from_millis(50));
    let result = engine.process_payment("42", PaymentMethodData::new()).await;

    assert_eq!(
        result.error(),
        Some("Timed out waiting for provider confirmation")
    );
    assert_eq!(
        log.entries(),
        vec![
            "create:42:CARD".to_string(),
            "provider-confirm:cs_1".to_string()
        ]
    );
}
