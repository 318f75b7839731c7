//! QuoteWatch - live market prices for one item
//!
//! Usage: quotewatch <ITEM_UNIQUE_NAME>
//!
//! Polls per-location prices on the configured interval, logs every refresh
//! with the best buy/sell locations marked and stops on Ctrl-C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quotewatch::client::AlbionDataClient;
use quotewatch::config::{AppConfig, LoggingConfig};
use quotewatch::market::group_thousands;
use quotewatch::polling::{ItemMetadataFetcher, PollSession, PollingScheduler, Publication};

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn render(publication: &Publication) {
    let trend = if publication.difference.is_profitable() {
        "💰"
    } else {
        "📉"
    };
    info!(
        item = %publication.item,
        updated_at = %publication.updated_at.format("%Y-%m-%d %H:%M:%S"),
        profitable = publication.difference.is_profitable(),
        "{} {}",
        trend,
        publication.difference
    );

    for quote in &publication.quotes {
        let marker = match (quote.is_best_sell, quote.is_best_buy) {
            (true, true) => "⬇⬆",
            (true, false) => "⬇ ",
            (false, true) => " ⬆",
            (false, false) => "  ",
        };
        info!(
            "{} {:<16} sell {:>12} - {:<12} buy {:>12} - {:<12}",
            marker,
            quote.location.display_name(),
            group_thousands(quote.sell_price_min),
            group_thousands(quote.sell_price_max),
            group_thousands(quote.buy_price_min),
            group_thousands(quote.buy_price_max),
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let item = std::env::args()
        .nth(1)
        .context("usage: quotewatch <ITEM_UNIQUE_NAME>")?;

    info!(config = %config, "🚀 QuoteWatch v{}", env!("CARGO_PKG_VERSION"));

    let client = AlbionDataClient::new(&config.api).context("Failed to create HTTP client")?;

    match client.fetch_item_metadata(&item).await {
        Ok(metadata) => info!(
            item = %metadata.unique_name,
            "🎯 Watching {}",
            metadata.title(&config.display.language)
        ),
        Err(e) => warn!(item = %item, error = %e, "Item data can not be loaded"),
    }

    let session = Arc::new(PollSession::new(
        item,
        config.refresh.interval_ms,
        config.locations.filter(),
    ));
    session.set_paused(!config.refresh.auto_update);

    let (tx, mut rx) = mpsc::channel::<Publication>(16);
    let handle = PollingScheduler::new(client, tx)
        .spawn(session.clone())
        .context("Poll session already running")?;

    loop {
        tokio::select! {
            publication = rx.recv() => match publication {
                Some(publication) => render(&publication),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping auto-refresh...");
                session.cancel();
                break;
            }
        }
    }

    drop(rx);
    handle.await.context("Polling task panicked")?;
    info!("👋 Bye");
    Ok(())
}
