pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod pricing;
pub mod quote;
pub mod reconcile;
pub mod routes;
pub mod store;
pub mod telemetry;

// Re-export main items
pub use config::Config;
pub use error::{ApiError, CatalogError, CodecError, QuoteError};
pub use models::{
    BundleEvent, CatalogProduct, ItemSource, LineItem, Product, ServiceBundle, UnitOfMeasure,
};
pub use reconcile::{
    load_for_editing, prepare_for_save, resolve_catalog_items, EditableBundle, SavePayload,
};
pub use routes::{router, AppState};
