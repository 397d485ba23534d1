use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crpt_api::config::CrptConfig;
use crpt_api::{CrptApi, Document};

/// Submit documents to the registration endpoint under a client-side rate limit.
#[derive(Debug, Parser)]
#[command(name = "crpt-api", version, about)]
struct Args {
    /// YAML configuration file; `CRPT__*` environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file holding the document to submit
    #[arg(short, long)]
    document: PathBuf,

    /// Detached signature sent in the `Signature` header
    #[arg(short, long)]
    signature: String,

    /// Number of concurrent submissions of the document
    #[arg(short, long, default_value_t = 1)]
    repeat: usize,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init();
    }

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = CrptConfig::load(args.config.as_deref())?;
    info!(
        endpoint = %config.client.endpoint,
        unit = ?config.rate_limiting.unit,
        request_limit = config.rate_limiting.request_limit,
        "Configuration loaded"
    );

    let contents = tokio::fs::read_to_string(&args.document)
        .await
        .with_context(|| format!("reading {}", args.document.display()))?;
    let document: Document = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", args.document.display()))?;

    let api = CrptApi::from_config(&config)?;
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    let handles: Vec<_> = (0..args.repeat)
        .map(|n| {
            let api = api.clone();
            let document = document.clone();
            let signature = args.signature.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let result = api
                    .create_document_with_cancel(&document, &signature, &cancel)
                    .await;
                (n, result)
            })
        })
        .collect();

    let mut failures = 0usize;
    for handle in handles {
        let (n, result) = handle.await?;
        match result {
            Ok(()) => info!(submission = n, "Document registered"),
            Err(e) => {
                failures += 1;
                error!(submission = n, error = %e, "Document submission failed");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} submissions failed", failures, args.repeat);
    }

    info!(submissions = args.repeat, "All documents registered");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling pending submissions");
        }
        _ = terminate => {
            info!("Received SIGTERM, cancelling pending submissions");
        }
    }
}
