//! CareerHub Notifier — notification delivery and scheduling service.
//!
//! Main entry point that wires all crates together and starts the
//! worker runner and the cron scheduler.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use careerhub_core::config::AppConfig;
use careerhub_core::error::AppError;
use careerhub_core::traits::kv::KeyValueStore;
use careerhub_core::traits::provider::ChannelProvider;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Service error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("CAREERHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main service run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CareerHub Notifier v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = careerhub_database::DatabasePool::connect(&config.database).await?;

    if !db.health_check().await? {
        return Err(AppError::database("Database health check failed"));
    }

    careerhub_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Key-value store + distributed lock ───────────────
    tracing::info!(
        "Initializing key-value store (provider: {})...",
        config.cache.provider
    );
    let kv: Arc<dyn KeyValueStore> = match config.cache.provider.as_str() {
        "redis" => {
            let client = careerhub_cache::RedisClient::connect(&config.cache.redis).await?;
            Arc::new(careerhub_cache::RedisStore::new(client))
        }
        _ => Arc::new(careerhub_cache::MemoryStore::new()),
    };
    if !kv.health_check().await? {
        return Err(AppError::cache("Key-value store health check failed"));
    }
    let lock = careerhub_cache::DistributedLock::new(Arc::clone(&kv));

    // ── Step 3: Repositories ─────────────────────────────────────
    let notification_repo = Arc::new(
        careerhub_database::repositories::NotificationRepository::new(db.pool().clone()),
    );
    let job_repo = Arc::new(careerhub_database::repositories::JobRepository::new(
        db.pool().clone(),
    ));

    // ── Step 4: Delivery providers ───────────────────────────────
    tracing::info!("Initializing delivery providers...");
    let mut router = careerhub_notify::ProviderRouter::new();

    router.register(Arc::new(careerhub_notify::SmtpEmailProvider::new(
        &config.providers.smtp,
    )?));

    match careerhub_notify::SmsProvider::new(&config.providers.sms) {
        Ok(provider) => router.register(Arc::new(provider) as Arc<dyn ChannelProvider>),
        Err(e) => tracing::warn!("SMS provider disabled: {}", e),
    }
    match careerhub_notify::PushProvider::new(&config.providers.push) {
        Ok(provider) => router.register(Arc::new(provider) as Arc<dyn ChannelProvider>),
        Err(e) => tracing::warn!("Push provider disabled: {}", e),
    }

    let websocket_hub = Arc::new(careerhub_notify::WebsocketHub::new());
    router.register(Arc::new(careerhub_notify::WebsocketProvider::new(
        Arc::clone(&websocket_hub),
    )));

    let channels: Vec<String> = router
        .supported_channels()
        .iter()
        .map(|c| c.to_string())
        .collect();
    tracing::info!(channels = ?channels, "Delivery providers ready");
    let router = Arc::new(router);

    // ── Step 5: Queue, processor, sweeper ────────────────────────
    let queue = Arc::new(careerhub_worker::NotificationQueue::new(
        Arc::clone(&job_repo) as _,
        &config.queue,
    ));
    let processor = Arc::new(careerhub_worker::NotificationProcessor::new(
        Arc::clone(&notification_repo) as _,
        Arc::clone(&router),
    ));
    let sweeper = Arc::new(careerhub_worker::ScheduledSweeper::new(
        Arc::clone(&notification_repo) as _,
        Arc::clone(&queue),
        lock.clone(),
        config.sweeper.clone(),
    ));

    // ── Step 6: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 7: Start worker runner ──────────────────────────────
    let worker_handle = if config.worker.enabled {
        let worker_id = format!("worker-{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let runner = careerhub_worker::WorkerRunner::new(
            Arc::clone(&job_repo) as _,
            Arc::clone(&processor),
            config.worker.clone(),
            worker_id,
        );

        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_cancel).await;
        });

        tracing::info!("Worker runner started");
        Some(handle)
    } else {
        tracing::info!("Worker runner disabled");
        None
    };

    // ── Step 8: Start cron scheduler ─────────────────────────────
    let scheduler = if config.sweeper.enabled {
        let scheduler = careerhub_worker::CronScheduler::new(
            Arc::clone(&sweeper),
            lock.clone(),
            config.sweeper.clone(),
        )
        .await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Scheduled sweeps disabled");
        None
    };

    tracing::info!("CareerHub Notifier is running");

    // ── Step 9: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    if let Some(mut scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::error!("Scheduler shutdown error: {}", e);
        }
    }
    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(35), handle).await;
    }

    db.close().await;
    tracing::info!("CareerHub Notifier shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
