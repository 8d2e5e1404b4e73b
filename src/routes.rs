use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use rdkafka::producer::FutureProducer;
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, instrument, warn};

use crate::catalog;
use crate::config::Config;
use crate::error::{ApiError, ApiResult, CatalogError};
use crate::events::{self, W3CTraceContext};
use crate::models::{
    BundleEvent, CreateProductRequest, CreateServiceRequest, EditServiceResponse, LineItem,
    Product, ProductId, ServiceBundle, ServiceId, UpdateContentsRequest, UpdateProductRequest,
};
use crate::quote::{self, Quote, QuoteRequest};
use crate::reconcile::{self, SavePayload};
use crate::store;
use crate::telemetry::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub kafka_producer: Arc<FutureProducer>,
    pub metrics: Metrics,
    pub config: Arc<Config>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db_pool", &"<PgPool>")
            .field("kafka_producer", &"<FutureProducer>")
            .field("metrics", &self.metrics)
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub kafka: KafkaHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KafkaHealth {
    pub connected: bool,
    pub brokers: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product).patch(update_product))
        .route("/services", post(create_service))
        .route("/services/:id", get(get_service))
        .route("/services/:id/edit", get(edit_service))
        .route("/services/:id/contents", put(save_service_contents))
        .route("/quotes", post(create_quote))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            http_tracing_middleware,
        ))
        .with_state(state)
}

async fn http_tracing_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let span = info_span!("http_request", method = %method, path = %path, uri = %uri);

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();
    let status = response.status().as_u16();

    state.metrics.http_duration.observe(duration.as_secs_f64());

    if status >= 500 {
        error!(parent: &span, status, duration_ms = duration.as_millis(), "HTTP request completed");
    } else if status >= 400 {
        warn!(parent: &span, status, duration_ms = duration.as_millis(), "HTTP request completed");
    } else {
        info!(parent: &span, status, duration_ms = duration.as_millis(), "HTTP request completed");
    }

    response
}

#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let connected = events::kafka_reachable(state.kafka_producer.clone()).await;
    if !connected {
        warn!(brokers = %state.config.kafka_brokers, "Kafka is unreachable");
    }

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        kafka: KafkaHealth {
            connected,
            brokers: state.config.kafka_brokers.clone(),
        },
    })
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (content_type, body) = state.metrics.encode();
    ([(axum::http::header::CONTENT_TYPE, content_type)], body)
}

/// Time a storage call into the `db_query_duration` histogram.
async fn timed<T, F>(state: &AppState, operation: &'static str, fut: F) -> ApiResult<T>
where
    F: std::future::Future<Output = ApiResult<T>>,
{
    let start = std::time::Instant::now();
    let result = fut.await;
    let duration = start.elapsed();
    state.metrics.db_duration.observe(duration.as_secs_f64());

    match &result {
        Ok(_) => info!(operation, duration_ms = duration.as_millis(), "Database call completed"),
        Err(e) => error!(operation, error = %e, "Database call failed"),
    }

    result
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let products = timed(&state, "list_products", store::list_products(&state.db_pool)).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> ApiResult<Json<Product>> {
    timed(&state, "get_product", store::get_product(&state.db_pool, id))
        .await?
        .map(Json)
        .ok_or_else(|| {
            warn!("Product not found: {}", id);
            ApiError::NotFound(format!("product {id}"))
        })
}

#[instrument(skip(state, input), fields(product_name = %input.name))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = Product::from_request(0, &input).inspect_err(|e| {
        warn!("Invalid product: {}", e);
    })?;

    let product = timed(&state, "insert_product", store::insert_product(&state.db_pool, &product)).await?;

    info!(
        product_id = product.id,
        price = product.price,
        "Created product"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, input))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    let mut product = timed(&state, "get_product", store::get_product(&state.db_pool, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;

    product.apply_update(&input)?;

    let product = timed(&state, "update_product", store::update_product(&state.db_pool, &product)).await?;
    info!(product_id = product.id, price = product.price, "Updated product");

    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<ServiceId>,
) -> ApiResult<Json<ServiceBundle>> {
    timed(&state, "get_service", store::get_service(&state.db_pool, id))
        .await?
        .map(Json)
        .ok_or_else(|| {
            warn!("Service not found: {}", id);
            ApiError::NotFound(format!("service {id}"))
        })
}

/// Re-price catalog rows from the current catalog, then encode the batch.
async fn priced_contents(state: &AppState, items: &[LineItem]) -> ApiResult<SavePayload> {
    let catalog = timed(state, "catalog_snapshot", store::catalog_snapshot(&state.db_pool)).await?;

    reconcile::resolve_catalog_items(items, &catalog)
        .and_then(|items| reconcile::prepare_for_save(&items))
        .map_err(|e| {
            warn!("Rejected service contents: {}", e);
            ApiError::from(e)
        })
}

#[instrument(skip(state, headers, input), fields(title = %input.title))]
pub async fn create_service(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateServiceRequest>,
) -> ApiResult<(StatusCode, Json<ServiceBundle>)> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(CatalogError::EmptyTitle.into());
    }
    catalog::validate_image_urls(&input.image_urls)?;

    let payload = priced_contents(&state, &input.items).await?;

    let service = timed(
        &state,
        "insert_service",
        store::insert_service(
            &state.db_pool,
            title,
            &input.subtitle,
            &input.description,
            &input.image_urls,
            &payload,
        ),
    )
    .await?;

    info!(service_id = service.id, price = service.price, "Created service");
    publish_saved(&state, &service, events::extract_w3c_trace_context(&headers)).await;

    Ok((StatusCode::CREATED, Json(service)))
}

#[instrument(skip(state))]
pub async fn edit_service(
    State(state): State<AppState>,
    Path(id): Path<ServiceId>,
) -> ApiResult<Json<EditServiceResponse>> {
    let service = timed(&state, "get_service", store::get_service(&state.db_pool, id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("service {id}")))?;

    let catalog = timed(&state, "catalog_snapshot", store::catalog_snapshot(&state.db_pool)).await?;
    let editable = reconcile::load_for_editing(&service, &catalog);

    if !editable.dropped.is_empty() {
        warn!(
            service_id = id,
            dropped = editable.dropped.len(),
            "Service has content items that will be removed on next save"
        );
    }

    Ok(Json(EditServiceResponse {
        service,
        items: editable.items,
        dropped: editable.dropped,
    }))
}

#[instrument(skip(state, headers, input), fields(items = input.items.len()))]
pub async fn save_service_contents(
    State(state): State<AppState>,
    Path(id): Path<ServiceId>,
    headers: HeaderMap,
    Json(input): Json<UpdateContentsRequest>,
) -> ApiResult<Json<ServiceBundle>> {
    let payload = priced_contents(&state, &input.items).await?;

    let service = timed(
        &state,
        "save_service_contents",
        store::save_service_contents(&state.db_pool, id, &payload),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("service {id}")))?;

    info!(service_id = service.id, price = service.price, "Saved service contents");
    publish_saved(&state, &service, events::extract_w3c_trace_context(&headers)).await;

    Ok(Json(service))
}

#[instrument(skip(state, input), fields(selections = input.selections.len()))]
pub async fn create_quote(
    State(state): State<AppState>,
    Json(input): Json<QuoteRequest>,
) -> ApiResult<Json<Quote>> {
    let products = timed(&state, "list_products", store::list_products(&state.db_pool)).await?;
    let quote = quote::build_quote(&input.selections, &products, &state.config.order_greeting)?;

    info!(lines = quote.lines.len(), total = quote.total, "Built quote");
    Ok(Json(quote))
}

/// Publish a `bundle_saved` event. The write already succeeded, so failures only log.
async fn publish_saved(state: &AppState, service: &ServiceBundle, trace_context: Option<W3CTraceContext>) {
    let event = BundleEvent::saved(service);
    match events::publish_bundle_event(
        &state.kafka_producer,
        &event,
        &trace_context,
        &state.metrics.kafka_publish,
    )
    .await
    {
        Ok(()) => info!(service_id = service.id, "Bundle event published"),
        Err(e) => warn!(error = ?e, "Failed to publish to Kafka, but DB save succeeded"),
    }
}
