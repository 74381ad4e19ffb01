//! `stock-watch` — follow the live price stream in a terminal.
//!
//! Environment:
//! - `STOCK_API_URL`: service base URL (default `http://localhost:8082`)
//! - `STOCK_SYMBOL`: symbol whose history is printed on each update
//! - `RUST_LOG`: log filter (default `info`)

use std::env;

use stock_stream_sdk::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SdkError> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let base_url =
        env::var("STOCK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let mut config = DashboardConfig::default();
    if let Ok(symbol) = env::var("STOCK_SYMBOL") {
        config.default_symbol = Some(Symbol::from(symbol.trim().to_uppercase()));
    }

    let client = StockClient::builder().base_url(&base_url).build()?;
    match client.service().health().await {
        Ok(health) => info!(
            "Service {} is {} ({} symbols, {} messages)",
            health.service, health.status, health.total_symbols, health.total_messages
        ),
        Err(e) => warn!("Health check failed: {}", e),
    }

    let stream = client.stream();
    let mut dashboard = Dashboard::new(client, stream, config);

    let report = dashboard.load_initial().await?;
    for (symbol, error) in &report.failed {
        warn!("No history for {}: {}", symbol, error);
    }
    print_table(dashboard.state());

    dashboard.start_stream()?;
    info!("Streaming from {}", dashboard.source().stream_config().url);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            update = dashboard.next_update() => match update {
                Some(DashboardUpdate::Price(price)) => {
                    let arrow = if price.is_up() { "▲" } else { "▼" };
                    println!(
                        "{:<6} {:>10.2} {} {:+.2} ({:+.2}%)  [{}]",
                        price.symbol,
                        price.price,
                        arrow,
                        price.change,
                        price.change_percent,
                        dashboard.state().received_count()
                    );
                }
                Some(DashboardUpdate::Error(e)) => warn!("Stream error: {}", e),
                None => {
                    warn!("Stream closed");
                    break;
                }
            },
        }
    }

    print_table(dashboard.state());
    dashboard.dispose();
    Ok(())
}

fn print_table(state: &DashboardState) {
    println!("{:<6} {:>10} {:>8} {:>8}", "SYMBOL", "PRICE", "CHANGE", "%");
    for p in state.sorted_prices() {
        println!(
            "{:<6} {:>10.2} {:>+8.2} {:>+8.2}",
            p.symbol, p.price, p.change, p.change_percent
        );
    }
    if let Some(symbol) = state.selected() {
        let history = state.selected_history();
        let (lo, hi) = history.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
            (lo.min(p.price), hi.max(p.price))
        });
        if history.is_empty() {
            println!("{}: no history", symbol);
        } else {
            println!(
                "{}: {} points, low {:.2}, high {:.2}",
                symbol,
                history.len(),
                lo,
                hi
            );
        }
    }
}
