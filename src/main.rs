//! Credit Gateway
//!
//! Command-line runner for the credit retrieval path.
//!
//! # Architecture Overview
//!
//! ```text
//!   LoanApplication
//!        │
//!        ▼
//!   ┌──────────────┐    ┌──────────────┐   fresh hit
//!   │ Underwriting │───▶│    Credit    │──────────────▶ TtlCache
//!   │  Evaluator   │    │   Gateway    │
//!   └──────────────┘    └──────┬───────┘
//!                              │ miss / expired
//!                              ▼
//!                       ┌──────────────┐    ┌──────────────┐    ┌─────────────┐
//!                       │ SingleFlight │───▶│   Circuit    │───▶│ HTTP bureau │
//!                       │  (per key)   │    │   Breaker    │    │ (deadline)  │
//!                       └──────────────┘    └──────────────┘    └─────────────┘
//!                              │ failure
//!                              ▼
//!                     stale entry or NoDataAvailable
//! ```

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

use credit_gateway::clock::{Clock, SystemClock};
use credit_gateway::config::{self, ConfigError, GatewayConfig};
use credit_gateway::credit::{HttpCreditSource, SubjectKey};
use credit_gateway::observability::{logging, metrics, MetricsObserver};
use credit_gateway::underwriting::LoanApplication;
use credit_gateway::{CreditGateway, UnderwritingEvaluator};

#[derive(Parser)]
#[command(name = "credit-gateway")]
#[command(about = "Resilient credit-score lookups for loan underwriting", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults plus environment overrides if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Underwrite one application per subject key, concurrently
    Evaluate {
        /// Subject key to look up (repeatable)
        #[arg(short, long = "subject", required = true)]
        subjects: Vec<String>,

        /// Requested loan amount
        #[arg(short, long, default_value_t = 10_000.0)]
        amount: f64,
    },
    /// Validate the configuration and print the effective values
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None => config::loader::config_from_env(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref())?;

    logging::init_logging(&config.observability);
    tracing::info!("credit-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Evaluate { subjects, amount } => {
            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr),
                    Err(e) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        error = %e,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let source = Arc::new(HttpCreditSource::new(&config.upstream.base_url, clock.clone())?);
            let gateway = Arc::new(CreditGateway::from_config(
                &config,
                source,
                clock.clone(),
                Arc::new(MetricsObserver),
            ));
            let evaluator = UnderwritingEvaluator::new(gateway, &config.underwriting);

            let mut tasks = JoinSet::new();
            for (i, subject) in subjects.into_iter().enumerate() {
                let evaluator = evaluator.clone();
                let clock = clock.clone();
                let application = LoanApplication {
                    id: i as u64 + 1,
                    applicant_name: String::new(),
                    subject_key: SubjectKey::from(subject),
                    loan_amount: amount,
                    loan_purpose: String::new(),
                    annual_income: 0.0,
                };
                tasks.spawn(async move {
                    let outcome = evaluator.evaluate(&application, clock.now()).await;
                    (application, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let (application, outcome) = joined?;
                let line = match outcome {
                    Ok(decision) => json!({
                        "application_id": application.id,
                        "subject": application.subject_key.to_string(),
                        "status": decision.status,
                        "reason": decision.reason,
                        "freshness": decision.freshness,
                        "score": decision.based_on.map(|r| r.score),
                    }),
                    Err(e) => json!({
                        "application_id": application.id,
                        "subject": application.subject_key.to_string(),
                        "error": e.to_string(),
                        "retryable": e.is_retryable(),
                    }),
                };
                println!("{}", line);
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
