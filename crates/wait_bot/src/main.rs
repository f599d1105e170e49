//! Main entry point for the TSA wait times bot.
//! This crate checks the ATL airport wait-time page on a fixed interval and posts
//! the current checkpoint wait times to X (Twitter).

use std::path::PathBuf;
use std::sync::Arc;

use atl_site::SiteClient;
use social_services::{TwitterClient, TwitterCredentials};
use tokio_util::sync::CancellationToken;

mod config;
mod logging;
mod scheduler;
mod shutdown;

use config::BotConfig;
use scheduler::{Scheduler, SchedulerSettings};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    let log_file = std::env::var_os(logging::LOG_FILE_VAR).map(PathBuf::from);
    logging::init(log_file.as_deref());

    log::info!("🚀 Starting TSA wait times bot...");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let credentials = match TwitterCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            log::error!("❌ {}", e);
            log::error!("💡 Please ensure all variables are set in your .env file");
            std::process::exit(1);
        }
    };

    let site_client = match SiteClient::new(config.fetch.clone()) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    log::info!("Performing health check...");
    if let Err(e) = site_client
        .check_connectivity(&config.health_check_url)
        .await
    {
        log::error!("❌ Network connectivity check failed: {}", e);
        log::error!("Health check failed. Exiting.");
        std::process::exit(1);
    }
    log::info!("✅ Health check passed");

    let twitter_client = match TwitterClient::new(
        credentials,
        config.twitter_api_base_url.clone(),
        config.fetch.request_timeout,
    ) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to initialize Twitter client: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    shutdown::spawn_signal_listener(shutdown.clone());

    let scheduler = Scheduler::new(
        Arc::new(site_client),
        Arc::new(twitter_client),
        SchedulerSettings::new(
            config.target_url.clone(),
            config.scrape_interval,
            config.thresholds,
        ),
    );

    log::info!(
        "📡 Watching {} every {} minutes",
        config.target_url,
        config.interval_minutes()
    );

    let iterations = scheduler.run(shutdown).await;
    log::info!("👋 Stopped after {} iterations", iterations);
}
