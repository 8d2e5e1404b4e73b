use std::sync::Arc;

use tracing::info;

use catering_bundles::{events, routes, store, telemetry, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    // Keep the provider alive so spans keep exporting
    let _otel_provider = telemetry::setup_tracing(&config)?;

    info!("Starting catering-bundles...");

    let metrics = telemetry::Metrics::new()?;

    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    info!("Connected to database");

    store::init_schema(&db_pool).await?;
    info!("Database schema initialized");

    let kafka_producer = events::create_kafka_producer(&config.kafka_brokers)?;
    info!("Kafka producer ready: {}", config.kafka_brokers);

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        db_pool,
        kafka_producer,
        metrics,
        config: Arc::new(config),
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
