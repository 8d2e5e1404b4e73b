//! Stored string form of a service's content items.
//!
//! A service keeps its contents as a list of strings:
//!
//! ```text
//! <quantity> <name>                catalog product, priced from the catalog
//! <quantity> <name> [<unit price>] custom item, price carried in the string
//! ```
//!
//! Decoding resolves names against a catalog snapshot. A catalog match always
//! takes the catalog price, even when the string carries its own.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CodecError;
use crate::models::{CatalogProduct, ItemSource, LineItem};

// ASCII digits only: a name ending in "[٣]" is text, not a price.
static CONTENT_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\s+(.+?)(?:\s+\[([0-9]+(?:\.[0-9]+)?)\])?$")
        .expect("valid content item regex")
});

static TRAILING_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s\[[0-9]+(?:\.[0-9]+)?\]$").expect("valid trailing price regex")
});

/// Encode a line item into its stored string.
pub fn encode(item: &LineItem) -> Result<String, CodecError> {
    if item.quantity < 1 {
        return Err(CodecError::InvalidQuantity(item.quantity));
    }

    // Control characters (newlines included) cannot be read back.
    let name = item.name.trim();
    if name.is_empty() || name.chars().any(char::is_control) {
        return Err(CodecError::InvalidName);
    }

    if !item.unit_price.is_finite() || item.unit_price < 0.0 {
        return Err(CodecError::InvalidPrice(item.unit_price));
    }

    match item.source {
        ItemSource::Catalog { .. } => {
            // "1 Box [3]" would decode as a custom "Box" priced at 3.
            if TRAILING_PRICE_RE.is_match(name) {
                return Err(CodecError::AmbiguousName(name.to_string()));
            }
            Ok(format!("{} {}", item.quantity, name))
        }
        ItemSource::Custom { .. } => {
            // -0.0 would print as "-0"
            let unit_price = if item.unit_price == 0.0 { 0.0 } else { item.unit_price };
            Ok(format!("{} {} [{}]", item.quantity, name, unit_price))
        }
    }
}

/// Decode a stored string against a catalog snapshot.
///
/// Returns `None` for anything that is not `<quantity> <name>` with a
/// positive quantity. Callers skip those entries.
pub fn decode(encoded: &str, catalog: &[CatalogProduct]) -> Option<LineItem> {
    let caps = CONTENT_ITEM_RE.captures(encoded.trim())?;

    let quantity: i64 = caps[1].parse().ok()?;
    if quantity < 1 {
        return None;
    }

    let name = caps[2].trim();
    if name.is_empty() {
        return None;
    }

    if let Some(product) = find_product(name, catalog) {
        return Some(LineItem::catalog(product, quantity));
    }

    let unit_price = match caps.get(3) {
        Some(price) => price.as_str().parse::<f64>().ok()?,
        None => 0.0,
    };

    Some(LineItem {
        name: name.to_string(),
        quantity,
        unit_price,
        source: ItemSource::Custom {
            local_id: custom_slug(name),
        },
    })
}

/// First catalog product whose normalized name equals `name`'s.
///
/// Duplicate names in the catalog are not disambiguated; catalog order wins.
pub fn find_product<'a>(name: &str, catalog: &'a [CatalogProduct]) -> Option<&'a CatalogProduct> {
    let key = normalize_name(name);
    catalog.iter().find(|p| normalize_name(&p.name) == key)
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Deterministic local id for a custom item, e.g. `"Balloon Arch"` becomes
/// `"custom-balloon-arch"`.
pub fn custom_slug(name: &str) -> String {
    let slug = normalize_name(name)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    format!("custom-{slug}")
}
