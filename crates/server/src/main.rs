//! HTTP service exposing the listing extractor.

use std::net::SocketAddr;
use std::time::Duration;

use annonce_core::{Extractor, ExtractorConfig, ProviderKeys, RateLimitPolicy};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod routes;

use app::{AppState, build_app};

const DEFAULT_LOG_FILTER: &str = "annonce_server=info,annonce_core=info,tower_http=info";

/// Listing extraction service
#[derive(Parser, Debug)]
#[command(name = "annonce-server", version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "ANNONCE_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Upper bound for one extraction, in seconds
    #[arg(long, env = "ANNONCE_REQUEST_TIMEOUT", default_value = "120")]
    request_timeout: u64,

    /// Requests allowed per client in one window
    #[arg(long, env = "ANNONCE_RATE_LIMIT", default_value = "10")]
    rate_limit: u32,

    /// Rate-limit window, in seconds
    #[arg(long, env = "ANNONCE_RATE_WINDOW", default_value = "300")]
    rate_window: u64,

    /// Custom User-Agent for direct requests
    #[arg(long, env = "ANNONCE_USER_AGENT")]
    user_agent: Option<String>,
}

impl Args {
    fn config(&self) -> ExtractorConfig {
        let mut builder = ExtractorConfig::builder().rate_limit(RateLimitPolicy {
            max_requests: self.rate_limit,
            window: Duration::from_secs(self.rate_window),
        });
        if let Some(ua) = &self.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        builder.build()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let args = Args::parse();
    let keys = ProviderKeys::from_env();
    let extractor = Extractor::from_keys(args.config(), &keys).context("Failed to build HTTP clients")?;

    let availability = extractor.availability();
    tracing::info!(
        rendering = availability.rendering,
        readable = availability.readable,
        crawl = availability.crawl,
        direct = availability.direct,
        "providers resolved"
    );

    let app = build_app(AppState::new(extractor, Duration::from_secs(args.request_timeout)));
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    tracing::info!(addr = %args.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
