use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use prometheus::Counter;
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use tracing::{error, info, info_span, instrument, warn, Instrument};

use crate::models::BundleEvent;

pub const BUNDLES_TOPIC: &str = "bundles.saved";

#[derive(Debug, Clone, PartialEq)]
pub struct W3CTraceContext {
    pub trace_id: String,
    pub span_id: String,
}

impl W3CTraceContext {
    pub fn traceparent(&self) -> String {
        format!("00-{}-{}-01", self.trace_id, self.span_id)
    }
}

pub fn extract_w3c_trace_context(headers: &HeaderMap) -> Option<W3CTraceContext> {
    headers
        .get("traceparent")
        .and_then(|h| h.to_str().ok())
        .and_then(parse_traceparent)
}

/// Parse `00-{trace_id}-{span_id}-{flags}`.
pub fn parse_traceparent(traceparent: &str) -> Option<W3CTraceContext> {
    let mut parts = traceparent.split('-');
    let _version = parts.next()?;
    let trace_id = parts.next().filter(|id| !id.is_empty())?;
    let span_id = parts.next().filter(|id| !id.is_empty())?;

    Some(W3CTraceContext {
        trace_id: trace_id.to_string(),
        span_id: span_id.to_string(),
    })
}

pub fn create_kafka_producer(brokers: &str) -> anyhow::Result<Arc<FutureProducer>> {
    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("message.timeout.ms", "5000")
        .set("request.timeout.ms", "5000")
        .create()?;

    Ok(Arc::new(producer))
}

const METADATA_TIMEOUT: Duration = Duration::from_secs(1);

/// Whether any broker answers a metadata request within one second.
pub async fn kafka_reachable(producer: Arc<FutureProducer>) -> bool {
    let result = tokio::task::spawn_blocking(move || {
        producer
            .client()
            .fetch_metadata(None, METADATA_TIMEOUT)
            .map(|metadata| metadata.brokers().len())
    })
    .await;

    match result {
        Ok(Ok(brokers)) => brokers > 0,
        Ok(Err(e)) => {
            warn!(error = ?e, "Kafka metadata request failed");
            false
        }
        Err(e) => {
            error!(error = ?e, "Kafka metadata task failed");
            false
        }
    }
}

/// Publish a bundle event keyed by service id, carrying the caller's trace context.
#[instrument(skip_all, fields(topic = BUNDLES_TOPIC))]
pub async fn publish_bundle_event(
    producer: &FutureProducer,
    event: &BundleEvent,
    trace_context: &Option<W3CTraceContext>,
    kafka_publish_counter: &Counter,
) -> anyhow::Result<()> {
    let key = event.key();
    let payload = serde_json::to_vec(event)?;

    let traceparent = trace_context.as_ref().map(W3CTraceContext::traceparent);
    let headers = match &traceparent {
        Some(value) => OwnedHeaders::new().insert(Header {
            key: "traceparent",
            value: Some(value.as_str()),
        }),
        None => OwnedHeaders::new(),
    };

    let record = FutureRecord::to(BUNDLES_TOPIC)
        .payload(&payload)
        .key(&key)
        .headers(headers);

    let send_span = info_span!("kafka_send", topic = BUNDLES_TOPIC, service_id = %key);

    let start = std::time::Instant::now();
    let delivery = producer
        .send(record, Duration::from_secs(5))
        .instrument(send_span)
        .await;

    match delivery {
        Ok((partition, offset)) => {
            info!(
                partition = partition,
                offset = offset,
                duration_ms = start.elapsed().as_millis(),
                "Published to Kafka"
            );
            kafka_publish_counter.inc();
            Ok(())
        }
        Err((kafka_error, _)) => {
            error!(error = ?kafka_error, "Failed to publish to Kafka");
            Err(kafka_error.into())
        }
    }
}
