//! Postgres persistence for products and services.

use sqlx::PgPool;

use crate::error::{ApiError, ApiResult};
use crate::models::{CatalogProduct, Product, ProductId, ServiceBundle, ServiceId, UnitOfMeasure};
use crate::reconcile::SavePayload;

pub async fn init_schema(pool: &PgPool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            unit_of_measure TEXT NOT NULL,
            quantity DOUBLE PRECISION NOT NULL,
            purchase_cost DOUBLE PRECISION NOT NULL,
            cost DOUBLE PRECISION NOT NULL,
            profit_margin DOUBLE PRECISION NOT NULL,
            price DOUBLE PRECISION NOT NULL,
            minimum_order INTEGER NOT NULL DEFAULT 1,
            available BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            subtitle TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            price BIGINT NOT NULL,
            content_items TEXT[] NOT NULL DEFAULT '{}',
            image_urls TEXT[] NOT NULL DEFAULT '{}',
            available BOOLEAN NOT NULL DEFAULT TRUE,
            updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    unit_of_measure: String,
    quantity: f64,
    purchase_cost: f64,
    cost: f64,
    profit_margin: f64,
    price: f64,
    minimum_order: i32,
    available: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = ApiError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            name: row.name,
            unit_of_measure: row.unit_of_measure.parse::<UnitOfMeasure>()?,
            quantity: row.quantity,
            purchase_cost: row.purchase_cost,
            cost: row.cost,
            profit_margin: row.profit_margin,
            price: row.price,
            minimum_order: row.minimum_order,
            available: row.available,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    title: String,
    subtitle: String,
    description: String,
    price: i64,
    content_items: Vec<String>,
    image_urls: Vec<String>,
    available: bool,
}

impl From<ServiceRow> for ServiceBundle {
    fn from(row: ServiceRow) -> Self {
        ServiceBundle {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            price: row.price,
            content_items: row.content_items,
            image_urls: row.image_urls,
            available: row.available,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, unit_of_measure, quantity, purchase_cost, cost, \
                               profit_margin, price, minimum_order, available";

const SERVICE_COLUMNS: &str =
    "id, title, subtitle, description, price, content_items, image_urls, available";

pub async fn list_products(pool: &PgPool) -> ApiResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Product::try_from).collect()
}

/// Catalog snapshot for one editing session, in catalog order.
pub async fn catalog_snapshot(pool: &PgPool) -> ApiResult<Vec<CatalogProduct>> {
    let rows = sqlx::query_as::<_, (i64, String, f64)>(
        "SELECT id, name, price FROM products ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, price)| CatalogProduct { id, name, price })
        .collect())
}

pub async fn get_product(pool: &PgPool, id: ProductId) -> ApiResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Product::try_from).transpose()
}

pub async fn insert_product(pool: &PgPool, product: &Product) -> ApiResult<Product> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        INSERT INTO products (name, unit_of_measure, quantity, purchase_cost, cost,
                              profit_margin, price, minimum_order, available)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(&product.name)
    .bind(product.unit_of_measure.as_str())
    .bind(product.quantity)
    .bind(product.purchase_cost)
    .bind(product.cost)
    .bind(product.profit_margin)
    .bind(product.price)
    .bind(product.minimum_order)
    .bind(product.available)
    .fetch_one(pool)
    .await?;

    Product::try_from(row)
}

pub async fn update_product(pool: &PgPool, product: &Product) -> ApiResult<Product> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        UPDATE products
        SET name = $2, unit_of_measure = $3, quantity = $4, purchase_cost = $5, cost = $6,
            profit_margin = $7, price = $8, minimum_order = $9, available = $10
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(product.id)
    .bind(&product.name)
    .bind(product.unit_of_measure.as_str())
    .bind(product.quantity)
    .bind(product.purchase_cost)
    .bind(product.cost)
    .bind(product.profit_margin)
    .bind(product.price)
    .bind(product.minimum_order)
    .bind(product.available)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Product::try_from(row),
        None => Err(ApiError::NotFound(format!("product {}", product.id))),
    }
}

pub async fn get_service(pool: &PgPool, id: ServiceId) -> ApiResult<Option<ServiceBundle>> {
    let row = sqlx::query_as::<_, ServiceRow>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ServiceBundle::from))
}

pub async fn insert_service(
    pool: &PgPool,
    title: &str,
    subtitle: &str,
    description: &str,
    image_urls: &[String],
    payload: &SavePayload,
) -> ApiResult<ServiceBundle> {
    let row = sqlx::query_as::<_, ServiceRow>(&format!(
        r#"
        INSERT INTO services (title, subtitle, description, price, content_items, image_urls)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(subtitle)
    .bind(description)
    .bind(payload.price)
    .bind(&payload.content_items)
    .bind(image_urls)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Write contents and price in one statement so they never disagree.
pub async fn save_service_contents(
    pool: &PgPool,
    id: ServiceId,
    payload: &SavePayload,
) -> ApiResult<Option<ServiceBundle>> {
    let row = sqlx::query_as::<_, ServiceRow>(&format!(
        r#"
        UPDATE services
        SET content_items = $2, price = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&payload.content_items)
    .bind(payload.price)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ServiceBundle::from))
}
