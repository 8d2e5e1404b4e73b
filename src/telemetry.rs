use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Registry as TracingRegistry};

use crate::config::Config;

const METRICS_NAMESPACE: &str = "catering_bundles";

/// Prometheus instruments shared by the handlers.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub http_duration: Histogram,
    pub db_duration: Histogram,
    pub kafka_publish: Counter,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("registry", &"<Registry>")
            .finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let http_duration = Histogram::with_opts(
            HistogramOpts::new("http_server_duration", "HTTP request duration")
                .namespace(METRICS_NAMESPACE)
                .buckets(prometheus::exponential_buckets(0.005, 2.0, 10)?),
        )?;

        let db_duration = Histogram::with_opts(
            HistogramOpts::new("db_query_duration", "Database query duration")
                .namespace(METRICS_NAMESPACE)
                .buckets(prometheus::exponential_buckets(0.001, 2.0, 10)?),
        )?;

        let kafka_publish = Counter::with_opts(
            Opts::new("kafka_publish_count", "Number of Kafka messages published")
                .namespace(METRICS_NAMESPACE),
        )?;

        registry.register(Box::new(http_duration.clone()))?;
        registry.register(Box::new(db_duration.clone()))?;
        registry.register(Box::new(kafka_publish.clone()))?;

        Ok(Self {
            registry,
            http_duration,
            db_duration,
            kafka_publish,
        })
    }

    /// Text exposition format, as served on `/metrics`.
    pub fn encode(&self) -> (String, String) {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let body = encoder.encode_to_string(&families).unwrap_or_default();
        (encoder.format_type().to_string(), body)
    }
}

fn resource(config: &Config) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("deployment.environment", "production"),
    ])
}

/// Install the global subscriber: env filter, fmt output and OTLP span export.
/// The returned provider must be kept alive for spans to be exported.
pub fn setup_tracing(config: &Config) -> anyhow::Result<TracerProvider> {
    use opentelemetry_otlp::WithExportConfig;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(format!("{}/v1/traces", config.otlp_endpoint.trim_end_matches('/')))
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(resource(config))
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    TracingRegistry::default()
        .with(env_filter)
        .with(telemetry_layer)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(provider)
}
