use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, bail};

use po_intake::channels::spawn_email_poller;
use po_intake::config::IntakeConfig;
use po_intake::orders::HeaderMap;
use po_intake::pipeline::{OrderPipeline, process_csv};
use po_intake::store::JsonDirectorySink;

const USAGE: &str = "usage: po-intake [watch | convert <file.csv>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["watch"] => watch().await,
        ["convert", path] => convert(path).await,
        _ => bail!(USAGE),
    }
}

/// Parse and consolidate a local CSV file, printing the orders as JSON.
async fn convert(path: &str) -> anyhow::Result<()> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {path}"))?;
    let orders = process_csv(&raw, &HeaderMap::purchase_order())
        .with_context(|| format!("converting {path}"))?;
    println!("{}", serde_json::to_string_pretty(&orders)?);
    Ok(())
}

/// Poll the mailbox until Ctrl-C.
async fn watch() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        bail!("failed to install rustls crypto provider");
    }

    let config = IntakeConfig::from_env().context("loading configuration")?;

    eprintln!("📬 po-intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   IMAP: {}:{} ({})", config.email.host, config.email.port, config.email.mailbox);
    eprintln!("   Output: {}", config.output.directory.display());
    eprintln!(
        "   Naming: {:?}, rejected attachments: {:?}\n",
        config.output.naming, config.output.rejected
    );

    let sink = Arc::new(JsonDirectorySink::new(
        config.output.directory.clone(),
        config.output.naming,
    ));
    let pipeline = Arc::new(OrderPipeline::new(
        HeaderMap::purchase_order(),
        sink,
        &config.output,
    ));

    let (handle, shutdown) = spawn_email_poller(config.email, pipeline);

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("Shutdown requested");
    shutdown.store(true, Ordering::Relaxed);
    handle.abort();

    Ok(())
}
