use anyhow::Context;
use lakeshare_cloud::{AlarmSink, AwsPolicyClient, LogAlarmSink, SessionManager, SnsAlarmSink};
use lakeshare_sharing::{SharingContext, create_task_worker};
use lakeshare_store::ShareStore;
use lakeshare_worker::{CONFIG_ENV, WorkerConfig};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let config = WorkerConfig::resolve(std::env::args().nth(1), std::env::var(CONFIG_ENV).ok())
        .context("loading worker config")?;

    let store = ShareStore::open(&config.store_path)
        .with_context(|| format!("opening share store {}", config.store_path.display()))?;

    let sessions = Arc::new(SessionManager::from_env(config.cloud.clone()).await);
    let alarms: Arc<dyn AlarmSink> = match &config.cloud.alarms_topic_arn {
        Some(topic) => Arc::new(SnsAlarmSink::new(sessions.base_config(), topic.clone())),
        None => Arc::new(LogAlarmSink),
    };
    let client = Arc::new(AwsPolicyClient::new(
        sessions.clone(),
        config.cloud.retry.clone(),
    ));

    let ctx = SharingContext::new(
        store.clone(),
        client,
        alarms,
        config.cloud.clone(),
        config.sharing.clone(),
    );
    let (handle, mut worker) =
        create_task_worker(ctx, config.poll_interval(), config.batch_size);

    info!(
        store = %config.store_path.display(),
        region = %config.cloud.region,
        envname = %config.cloud.envname,
        "lakeshare worker starting"
    );
    let running = tokio::spawn(async move { worker.run().await });

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");
    if let Err(e) = handle.stop().await {
        error!("failed to stop task worker: {e}");
    }
    running.await.context("task worker panicked")?;

    if let Err(e) = store.checkpoint() {
        error!("final checkpoint failed: {e}");
    }
    Ok(())
}
