use serde::{Deserialize, Serialize};

pub type ProductId = i64;
pub type ServiceId = i64;

/// Maximum number of images a service bundle may reference.
pub const MAX_SERVICE_IMAGES: usize = 3;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitOfMeasure {
    Unit,
    Kilogram,
}

/// A stored catalog product. `cost` and `price` are derived, see [`crate::catalog`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit_of_measure: UnitOfMeasure,
    pub quantity: f64,
    pub purchase_cost: f64,
    pub cost: f64,
    pub profit_margin: f64,
    pub price: f64,
    pub minimum_order: i32,
    pub available: bool,
}

/// The slice of a product the content codec needs: identity, name and price.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
}

impl CatalogProduct {
    pub fn new(id: ProductId, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}

impl From<&Product> for CatalogProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateProductRequest {
    pub name: String,
    pub unit_of_measure: String,
    pub quantity: f64,
    pub purchase_cost: f64,
    pub profit_margin: f64,
    pub minimum_order: Option<i32>,
    pub available: Option<bool>,
}

/// Partial product update; absent fields keep their stored value.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub unit_of_measure: Option<String>,
    pub quantity: Option<f64>,
    pub purchase_cost: Option<f64>,
    pub profit_margin: Option<f64>,
    pub minimum_order: Option<i32>,
    pub available: Option<bool>,
}

/// Where a line item's price comes from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemSource {
    /// Backed by a catalog product; the catalog price is authoritative.
    Catalog { product_id: ProductId },
    /// Ad-hoc item that only exists inside this bundle. The local id is a
    /// session-scoped slug and never a catalog reference.
    Custom {
        #[serde(default)]
        local_id: String,
    },
}

/// One row of a service bundle while it is being edited.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub source: ItemSource,
}

impl LineItem {
    pub fn catalog(product: &CatalogProduct, quantity: i64) -> Self {
        Self {
            name: product.name.clone(),
            quantity,
            unit_price: product.price,
            source: ItemSource::Catalog {
                product_id: product.id,
            },
        }
    }

    pub fn custom(name: impl Into<String>, quantity: i64, unit_price: f64) -> Self {
        let name = name.into();
        let local_id = crate::codec::custom_slug(&name);
        Self {
            name,
            quantity,
            unit_price,
            source: ItemSource::Custom { local_id },
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.source, ItemSource::Custom { .. })
    }

    pub fn catalog_id(&self) -> Option<ProductId> {
        match self.source {
            ItemSource::Catalog { product_id } => Some(product_id),
            ItemSource::Custom { .. } => None,
        }
    }
}

/// A stored service: a named bundle of products sold at one price.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServiceBundle {
    pub id: ServiceId,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub price: i64,
    pub content_items: Vec<String>,
    pub image_urls: Vec<String>,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateServiceRequest {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdateContentsRequest {
    pub items: Vec<LineItem>,
}

/// Editable view of a stored service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditServiceResponse {
    pub service: ServiceBundle,
    pub items: Vec<LineItem>,
    /// Stored entries that could not be parsed. They are not part of `items`
    /// and will be gone after the next save.
    pub dropped: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum BundleEvent {
    #[serde(rename = "bundle_saved")]
    Saved {
        event_id: String,
        service_id: ServiceId,
        price: i64,
        content_items: Vec<String>,
        saved_at: String,
    },
}

impl BundleEvent {
    pub fn saved(service: &ServiceBundle) -> Self {
        BundleEvent::Saved {
            event_id: uuid::Uuid::new_v4().to_string(),
            service_id: service.id,
            price: service.price,
            content_items: service.content_items.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn key(&self) -> String {
        match self {
            BundleEvent::Saved { service_id, .. } => service_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_source_accessors() {
        let chair = CatalogProduct::new(4, "Chair", 8.0);
        let item = LineItem::catalog(&chair, 2);
        assert!(!item.is_custom());
        assert_eq!(item.catalog_id(), Some(4));

        let custom = LineItem::custom("Balloon arch", 1, 40.0);
        assert!(custom.is_custom());
        assert_eq!(custom.catalog_id(), None);
    }

    #[test]
    fn test_line_item_json_shape() {
        let json = r#"{"name":"Tent","quantity":1,"unit_price":100,"source":{"kind":"catalog","product_id":7}}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.catalog_id(), Some(7));
        assert_eq!(item.unit_price, 100.0);
    }

    #[test]
    fn test_custom_source_without_local_id() {
        let json = r#"{"name":"Cake","quantity":1,"unit_price":30.5,"source":{"kind":"custom"}}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert!(item.is_custom());
    }

    #[test]
    fn test_bundle_event_key_is_service_id() {
        let service = ServiceBundle {
            id: 12,
            title: "Party".to_string(),
            subtitle: String::new(),
            description: String::new(),
            price: 150,
            content_items: vec!["1 Tent".to_string()],
            image_urls: vec![],
            available: true,
        };
        let event = BundleEvent::saved(&service);
        assert_eq!(event.key(), "12");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "bundle_saved");
        assert_eq!(value["price"], 150);
    }
}
