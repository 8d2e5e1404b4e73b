//! Moving a service between its stored form and the editor's rows.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec;
use crate::error::CodecError;
use crate::models::{CatalogProduct, LineItem, ServiceBundle};
use crate::pricing;

/// Rows decoded from a stored service, plus whatever could not be decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableBundle {
    pub items: Vec<LineItem>,
    pub dropped: Vec<String>,
}

/// The two stored fields of a service, always derived from one snapshot of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub content_items: Vec<String>,
    pub price: i64,
}

/// Decode every stored content string of `bundle`.
///
/// Unparseable entries are left out of `items` and reported in `dropped`.
pub fn load_for_editing(bundle: &ServiceBundle, catalog: &[CatalogProduct]) -> EditableBundle {
    let mut editable = EditableBundle::default();

    for entry in &bundle.content_items {
        match codec::decode(entry, catalog) {
            Some(item) => editable.items.push(item),
            None => {
                warn!(
                    service_id = bundle.id,
                    entry = %entry,
                    "Dropping unparseable content item"
                );
                editable.dropped.push(entry.clone());
            }
        }
    }

    editable
}

/// Replace name and price of catalog-backed rows with the catalog's own.
///
/// Custom rows pass through unchanged. A row pointing at a product missing
/// from `catalog` fails the whole batch.
pub fn resolve_catalog_items(
    items: &[LineItem],
    catalog: &[CatalogProduct],
) -> Result<Vec<LineItem>, CodecError> {
    items
        .iter()
        .map(|item| match item.catalog_id() {
            Some(product_id) => catalog
                .iter()
                .find(|p| p.id == product_id)
                .map(|product| LineItem::catalog(product, item.quantity))
                .ok_or(CodecError::UnknownProduct(product_id)),
            None => Ok(item.clone()),
        })
        .collect()
}

/// Encode `items` and price them. Fails without output if any item is invalid.
pub fn prepare_for_save(items: &[LineItem]) -> Result<SavePayload, CodecError> {
    let content_items = items
        .iter()
        .map(codec::encode)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SavePayload {
        content_items,
        price: pricing::round_price(pricing::compute_total(items)),
    })
}
