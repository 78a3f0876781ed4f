use card_checkout::application::orchestrator::{ACCESS_TOKEN_KEY, PaymentOrchestrator};
use card_checkout::config::{CheckoutConfig, DEFAULT_BACKEND_URL, DEFAULT_PROVIDER_URL};
use card_checkout::domain::ports::{BackendBox, CredentialStoreBox, ProviderBox};
use card_checkout::domain::provider::PaymentMethodData;
use card_checkout::infrastructure::in_memory::{
    EnvCredentialStore, InMemoryCredentialStore, InMemoryErrorDisplay,
};
use card_checkout::infrastructure::stripe::StripeProvider;
use card_checkout::interfaces::csv::payment_writer::PaymentHistoryWriter;
use card_checkout::interfaces::http::backend_client::HttpPaymentBackend;
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Element id the headless card input is mounted at.
const CARD_ELEMENT_ID: &str = "card-element";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the backend payment API
    #[arg(long, env = "CHECKOUT_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,

    /// Base URL of the payment provider API
    #[arg(long, env = "CHECKOUT_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
    provider_url: String,

    /// Publishable provider key (only needed for `pay`)
    #[arg(long, env = "CHECKOUT_PUBLISHABLE_KEY", default_value = "")]
    publishable_key: String,

    /// Bearer token for the backend. Falls back to the CHECKOUT_ACCESS_TOKEN variable.
    #[arg(long)]
    access_token: Option<String>,

    /// Timeout for every network call, in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pay for an order with a tokenized card
    Pay {
        order_id: String,
        /// Tokenized payment method (pm_... or tok_...)
        #[arg(long)]
        payment_method: String,
    },
    /// List payment history
    History {
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
    /// Show a single payment
    Details { payment_id: String },
    /// Request a refund for a payment
    Refund {
        payment_id: String,
        amount: Decimal,
        reason: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CheckoutConfig {
        backend_url: cli.backend_url,
        provider_url: cli.provider_url,
        publishable_key: cli.publishable_key,
        timeout_ms: cli.timeout_ms,
    };
    config.validate().into_diagnostic()?;

    let credentials: CredentialStoreBox = match cli.access_token {
        Some(token) => {
            let store = InMemoryCredentialStore::new();
            store.set(ACCESS_TOKEN_KEY, token).await;
            Box::new(store)
        }
        None => Box::new(EnvCredentialStore::new("CHECKOUT")),
    };
    let backend: BackendBox = Box::new(HttpPaymentBackend::from_config(&config).into_diagnostic()?);
    let provider = StripeProvider::from_config(&config).into_diagnostic()?;
    let elements = provider.elements();
    let provider: ProviderBox = Box::new(provider);
    let orchestrator = PaymentOrchestrator::new(provider, backend, credentials)
        .with_step_timeout(config.timeout());

    match cli.command {
        Command::Pay {
            order_id,
            payment_method,
        } => {
            let display = InMemoryErrorDisplay::new();
            orchestrator
                .initialize_card(CARD_ELEMENT_ID, Arc::new(display.clone()))
                .into_diagnostic()?;
            let card = elements
                .card()
                .ok_or_else(|| miette!("Card input was not created"))?;
            if !card.update(&payment_method).complete {
                return Err(miette!("{}", display.text()));
            }

            let result = orchestrator
                .process_payment(&order_id, PaymentMethodData::new())
                .await;
            print_json(&result)?;
            if !result.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::History { format } => {
            let payments = orchestrator.payment_history().await.into_diagnostic()?;
            match format {
                OutputFormat::Csv => {
                    let stdout = io::stdout();
                    PaymentHistoryWriter::new(stdout.lock())
                        .write_payments(&payments)
                        .into_diagnostic()?;
                }
                OutputFormat::Json => print_json(&payments)?,
            }
        }
        Command::Details { payment_id } => {
            let payment = orchestrator
                .payment_details(&payment_id)
                .await
                .into_diagnostic()?;
            print_json(&payment)?;
        }
        Command::Refund {
            payment_id,
            amount,
            reason,
        } => {
            let refund = orchestrator
                .request_refund(&payment_id, amount, &reason)
                .await
                .into_diagnostic()?;
            print_json(&refund)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
