use mrn_backend::config;
use mrn_backend::module::publisher::{LogPublisher, Publisher, WebhookPublisher};
use mrn_backend::module::relay::{DedupTracker, HttpFeedSource, JsonFileStateStore, RelayUpdater};
use mrn_backend::module::scheduled::{ScheduledTaskConfig, ScheduledTaskManager};

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::read_config()?;

    // Initialize logging
    let _logging_guard = mrn_backend::logging::init_logging(&config.log_dir, "mrn-backend", &config.log_level)?;

    tracing::info!("MRN Backend starting...");
    if !Path::new(config::CONFIG_PATH).exists() {
        tracing::warn!("Config file {} not found, using defaults", config::CONFIG_PATH);
    }

    let feeds = Arc::new(HttpFeedSource::new(
        config.feed_base_url.clone(),
        config.request_timeout(),
        &config.user_agent,
    )?);

    let publisher: Arc<dyn Publisher> = match &config.webhook {
        Some(webhook) => {
            tracing::info!("Alerts will be posted to webhook {}", webhook.url);
            Arc::new(WebhookPublisher::new(webhook, config.request_timeout())?)
        }
        None => {
            tracing::info!("No webhook configured, alerts go to the log only");
            Arc::new(LogPublisher)
        }
    };

    // Restore what was already announced so a restart does not repeat alerts
    let store = Arc::new(JsonFileStateStore::new(&config.state_path));
    let tracker = DedupTracker::load(store, chrono::Duration::days(config.retention_days))
        .await
        .with_context(|| format!("Failed to load announcement state from {}", config.state_path))?;
    tracing::info!(
        "Loaded announcement state: {} windows, {} downlinks",
        tracker.state().windows.len(),
        tracker.state().downlinks.len()
    );

    let updater = RelayUpdater::new(
        feeds,
        publisher,
        tracker,
        chrono::Duration::minutes(config.refresh_interval_minutes),
    );

    // Configure and start scheduled tasks
    let task_config = ScheduledTaskConfig {
        tick_interval_secs: config.tick_interval_secs,
    };
    let mut task_manager = ScheduledTaskManager::new(task_config);
    task_manager.start_relay_poll_task(updater);
    tracing::info!("All scheduled tasks started successfully");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    task_manager.shutdown().await;

    Ok(())
}
