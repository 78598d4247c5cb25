//! # Docketly Notification Worker
//!
//! Drains the notification outbox and emails account, submission and payment
//! notices, attaching invoice PDFs.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p docketly-worker
//! ```
//!
//! Without `EMAIL_API_KEY` emails are logged instead of sent.

use docketly_shared::{
    crypto::FieldCipher,
    db::pool::{close_pool, create_pool, DatabaseConfig},
    services::InvoiceService,
};
use docketly_worker::{
    config::WorkerConfig,
    mailer,
    orchestrator::{Notifier, NotifierConfig},
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docketly_worker=debug,docketly_shared=info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received, finishing current batch");
    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Docketly Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::load()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database_max_connections,
        min_connections: 1,
        ..DatabaseConfig::from_url(config.database_url.clone())
    })
    .await?;

    let cipher = FieldCipher::from_hex_key(&config.field_encryption_key)?;
    let invoices = InvoiceService::new(pool.clone(), cipher);
    let mailer = mailer::from_config(&config.email)?;

    let notifier = Notifier::new(pool.clone(), invoices, mailer, NotifierConfig::from(&config));
    tokio::spawn(cancel_on_signal(notifier.shutdown_token()));

    notifier.run().await?;

    close_pool(pool).await;
    tracing::info!("Worker stopped");
    Ok(())
}
