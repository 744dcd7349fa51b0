// gwlive entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr; stdout carries the report)
// 2. Load config, seeding it from defaults/ on first run
// 3. Build the HTTP feed
// 4. Run the poll loop until Ctrl+C or the poll limit

use std::sync::Arc;

use anyhow::Context;
use gwlive_app::app;
use gwlive_app::config;
use gwlive_app::feed::HttpFeed;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("gwlive starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        base_url = %config.feed.base_url,
        interval_secs = config.poll.interval_secs,
        entries = config.entries.ids.len(),
        "config loaded"
    );

    let feed = HttpFeed::from_config(&config.feed).context("failed to build HTTP client")?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    app::run(config, Arc::new(feed), shutdown).await?;

    info!("gwlive shut down cleanly");
    Ok(())
}

/// Log to stderr so the per-entry report on stdout stays clean.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gwlive_app=info,gwlive_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
