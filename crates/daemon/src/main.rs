//! Carelens Document Engine - Main Entry Point
//! Composition root: configuration, dependency wiring, listener lifecycle.

mod config;
mod telemetry;

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use carelens_core::application::{
    shutdown_channel, DocumentJobService, PipelineSettings, QueueListener,
};
use carelens_core::port::id_provider::UuidProvider;
use carelens_core::port::time_provider::SystemTimeProvider;
use carelens_core::port::{
    BlobStore, CallbackNotifier, DocumentExtractor, EntityRecognizer, InMemoryQueue,
    KeywordRecognizer, MessageQueue, MockDocumentExtractor,
};
use carelens_infra_http::{
    DocumentAiConfig, DocumentAiExtractor, HealthcareNlConfig, HealthcareNlRecognizer,
    HttpBlobStore, HttpCallbackNotifier,
};
use carelens_infra_sqlite::{create_pool, run_migrations, SqliteJobStore};
use config::Config;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (JSON format for production)
    let log_format = std::env::var("CARELENS_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Carelens Document Engine v{} starting...", VERSION);

    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 2. Load configuration
    let config = Config::from_env()?;
    info!(
        db_path = %config.db_path,
        topic = %config.queue_topic,
        mock_backends = config.use_mock_backends,
        "Configuration loaded"
    );

    // 3. Initialize database
    let pool = create_pool(&config.db_path)
        .await
        .map_err(|e| anyhow!("DB pool creation failed: {e}"))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow!("Migration failed: {e}"))?;

    // 4. Setup dependencies (DI wiring); backend selection happens exactly once
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let job_store = Arc::new(SqliteJobStore::new(pool.clone()));
    let queue: Arc<dyn MessageQueue> = Arc::new(InMemoryQueue::new());
    let notifier: Arc<dyn CallbackNotifier> = Arc::new(
        HttpCallbackNotifier::new().map_err(|e| anyhow!("Notifier setup failed: {e}"))?,
    );

    let (extractor, recognizer): (Arc<dyn DocumentExtractor>, Arc<dyn EntityRecognizer>) =
        if config.use_mock_backends {
            (Arc::new(MockDocumentExtractor), Arc::new(KeywordRecognizer))
        } else {
            let document_ai_endpoint = config
                .document_ai_endpoint
                .clone()
                .ok_or_else(|| anyhow!("CARELENS_DOCUMENT_AI_ENDPOINT required without mocks"))?;
            let healthcare_nl_endpoint = config
                .healthcare_nl_endpoint
                .clone()
                .ok_or_else(|| anyhow!("CARELENS_HEALTHCARE_NL_ENDPOINT required without mocks"))?;

            let blob_store: Arc<dyn BlobStore> = Arc::new(
                HttpBlobStore::new().map_err(|e| anyhow!("Blob store setup failed: {e}"))?,
            );
            let extractor = DocumentAiExtractor::new(
                blob_store,
                DocumentAiConfig {
                    endpoint: document_ai_endpoint,
                    form_parser_processor: config.document_ai_form_parser.clone(),
                    ocr_processor: config.document_ai_ocr.clone(),
                    processor_override: config.document_ai_processor_override.clone(),
                },
            )
            .map_err(|e| anyhow!("Extractor setup failed: {e}"))?;
            let recognizer = HealthcareNlRecognizer::new(HealthcareNlConfig {
                endpoint: healthcare_nl_endpoint,
                salience_threshold: config.salience_threshold,
            })
            .map_err(|e| anyhow!("Recognizer setup failed: {e}"))?;

            (Arc::new(extractor), Arc::new(recognizer))
        };

    let settings = PipelineSettings {
        topic: config.queue_topic.clone(),
        confidence_threshold: config.confidence_threshold,
        include_umls: config.include_umls,
    };

    let orchestrator = Arc::new(DocumentJobService::new(
        extractor,
        recognizer,
        job_store,
        queue.clone(),
        notifier,
        id_provider,
        time_provider,
        settings,
    ));

    // 5. Start queue listener (job processing loop)
    info!("Starting queue listener...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let listener = QueueListener::new(config.queue_topic.clone(), queue, orchestrator);
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run(shutdown_rx).await {
            tracing::error!(error = ?e, "Queue listener failed");
        }
    });

    info!("System ready. Waiting for jobs...");
    info!("Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), listener_handle).await;

    info!("Shutdown complete.");

    Ok(())
}
