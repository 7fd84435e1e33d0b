//! Credit Risk Scoring Service - Main Entry Point
//!
//! Receives applicant profiles over NATS, scores them, and replies with the
//! default probability, credit score and risk rating.

use anyhow::Result;
use credit_risk_scoring::{
    config::{AppConfig, LoggingConfig},
    consumer::{decode_application, ApplicationConsumer},
    metrics::{MetricsReporter, ScoringMetrics},
    pipeline::CreditRiskScorer,
    producer::ResultProducer,
    types::ScoreResponse,
    workers::WorkerLimiter,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("credit_risk_scoring={}", logging.level))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/config.toml".to_string());

    // Load configuration
    let config = AppConfig::load_from_path(&config_path)?;
    init_logging(&config.logging)?;

    info!(path = %config_path, "Configuration loaded successfully");
    info!(
        calibration = %config.scoring.version,
        score_range = format!("{}-{}", config.scoring.score.min_score, config.scoring.score.max_score),
        bands = config.scoring.rating.bands.len(),
        encoding = ?config.scoring.features.encoding,
        "Scoring calibration"
    );

    // Load the classifier once; every request shares it
    let scorer = Arc::new(CreditRiskScorer::from_config(&config)?);
    info!(
        model = scorer.classifier().name(),
        features = scorer.classifier().feature_names().len(),
        "Credit risk scorer initialized"
    );

    let metrics = Arc::new(ScoringMetrics::new(&config.scoring.score));

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = ApplicationConsumer::new(client.clone(), &config.nats);
    let producer = Arc::new(ResultProducer::new(client.clone(), &config.nats.result_subject));

    let limiter = WorkerLimiter::new(config.pipeline.workers);
    info!(
        workers = limiter.workers(),
        requests = consumer.subject(),
        queue_group = consumer.queue_group().unwrap_or("-"),
        results = producer.subject(),
        "Starting application processing loop"
    );

    let model_version = Arc::new(config.model.version.clone());

    let metrics_clone = metrics.clone();
    let interval_secs = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        MetricsReporter::new(metrics_clone, interval_secs).start().await;
    });

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

        // Acquire permit (limits concurrent tasks)
        let permit = limiter.acquire().await?;

        let scorer = scorer.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let model_version = model_version.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let result =
                decode_application(&message.payload).and_then(|profile| scorer.predict(&profile));

            let processing_time = start_time.elapsed();
            match &result {
                Ok(score) => {
                    metrics.record_scored(processing_time, score.credit_score, &score.rating);
                    debug!(
                        probability = score.probability,
                        credit_score = score.credit_score,
                        rating = %score.rating,
                        processing_time_us = processing_time.as_micros(),
                        "Application scored"
                    );
                }
                Err(e) => {
                    metrics.record_rejected(processing_time, e.kind());
                    warn!(kind = e.kind(), error = %e, "Application rejected");
                }
            }

            let response =
                ScoreResponse::new(&model_version, scorer.calibration_version(), result);

            if let Err(e) = producer.publish(&response, message.reply.clone()).await {
                error!(
                    request_id = %response.request_id,
                    error = %e,
                    "Failed to publish score response"
                );
            }

            drop(permit);
        });
    }

    info!(
        in_flight = limiter.in_flight(),
        "Scoring service shutting down, waiting for in-flight requests..."
    );
    limiter.drain().await?;
    metrics.print_summary();

    Ok(())
}
