//! Churn Prediction Pipeline - Main Entry Point
//!
//! Loads the fitted artifacts, then consumes customer profiles from NATS,
//! scores them and publishes a response for each one.

use anyhow::{Context, Result};
use churn_prediction_pipeline::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    consumer::RequestConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    producer::ResponseProducer,
    Artifacts, ChurnPredictor, WorkerPool,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CHURN_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = AppConfig::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    init_tracing(&config.logging)?;

    info!("Starting Churn Prediction Pipeline");
    info!(path = %config_path, "Configuration loaded successfully");

    // Every artifact is loaded and cross-checked before the first request is accepted
    let artifacts = Artifacts::load(&config.artifacts).context("Failed to load artifacts")?;
    let predictor = Arc::new(ChurnPredictor::new(Arc::new(artifacts)));
    info!(
        "Predictor ready ({} features): {:?}",
        predictor.feature_count(),
        predictor.feature_names()
    );

    let metrics = Arc::new(PipelineMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(ResponseProducer::new(
        client.clone(),
        &config.nats.result_subject,
    ));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting request loop with {} parallel workers on {} (fallback results to {})",
        num_workers,
        consumer.subject(),
        producer.subject()
    );

    let workers = WorkerPool::new(num_workers)?;
    let processed_count = Arc::new(AtomicU64::new(0));

    if config.pipeline.metrics_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
        tokio::spawn(reporter.start());
    }

    let mut subscription = consumer.subscribe().await?;

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        };

        let predictor = predictor.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        workers
            .spawn(async move {
                let response = predictor.handle(&message.payload, &metrics);

                if let Err(e) = producer.publish(message.reply.clone(), &response).await {
                    error!(error = %e, "Failed to publish churn response");
                }

                let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                if count % 100 == 0 {
                    let processing_stats = metrics.get_processing_stats();
                    info!(
                        processed = count,
                        throughput = format!("{:.1} req/s", metrics.get_throughput()),
                        avg_latency_us = processing_stats.mean_us,
                        "Processing milestone"
                    );
                }
            })
            .await?;
    }

    drop(subscription);
    info!(in_flight = workers.in_flight(), "Waiting for in-flight requests");
    workers.drain().await?;
    client.flush().await.context("Failed to flush responses")?;

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let directives = logging.filter_directives(std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter {:?}", directives))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
