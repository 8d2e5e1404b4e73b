// API tests that run without Docker
// Cover the content codec, pricing and save/load contract through the public crate API

use catering_bundles::codec::{decode, encode};
use catering_bundles::pricing::compute_total;
use catering_bundles::{
    load_for_editing, prepare_for_save, resolve_catalog_items, CatalogProduct, CodecError,
    ItemSource, LineItem, ServiceBundle,
};
use proptest::prelude::*;

fn service(content_items: &[&str]) -> ServiceBundle {
    ServiceBundle {
        id: 1,
        title: "Garden party".to_string(),
        subtitle: String::new(),
        description: String::new(),
        price: 0,
        content_items: content_items.iter().map(|s| s.to_string()).collect(),
        image_urls: vec![],
        available: true,
    }
}

#[test]
fn test_custom_item_resolves_to_catalog_once_it_exists() {
    let chair = LineItem::custom("Chair", 2, 5.0);
    let encoded = encode(&chair).unwrap();
    assert_eq!(encoded, "2 Chair [5]");

    let catalog = vec![CatalogProduct::new(1, "Chair", 8.0)];
    let decoded = decode(&encoded, &catalog).unwrap();
    assert_eq!(decoded.name, "Chair");
    assert_eq!(decoded.quantity, 2);
    assert_eq!(decoded.unit_price, 8.0);
    assert!(!decoded.is_custom());
}

#[test]
fn test_garbage_entries_are_dropped() {
    assert!(decode("garbage", &[]).is_none());

    let catalog = vec![CatalogProduct::new(1, "Tent", 100.0)];
    let loaded = load_for_editing(&service(&["1 Tent", "garbage", "4 Lantern [3.5]"]), &catalog);
    assert_eq!(loaded.items.len(), 2);
    assert_eq!(loaded.dropped, vec!["garbage".to_string()]);
}

#[test]
fn test_pricer_totals() {
    assert_eq!(compute_total(&[]), 0.0);
    let items = vec![LineItem::custom("A", 3, 2.5), LineItem::custom("B", 1, 10.0)];
    assert_eq!(compute_total(&items), 17.5);
}

#[test]
fn test_save_price_rounds_independently_of_contents() {
    let tent = CatalogProduct::new(1, "Tent", 100.0);
    let mut items = vec![LineItem::catalog(&tent, 1)];

    let saved = prepare_for_save(&items).unwrap();
    assert_eq!(saved.content_items, vec!["1 Tent".to_string()]);
    assert_eq!(saved.price, 100);

    items[0].unit_price = 100.6;
    let saved = prepare_for_save(&items).unwrap();
    assert_eq!(saved.content_items, vec!["1 Tent".to_string()]);
    assert_eq!(saved.price, 101);
}

#[test]
fn test_validation_blocks_save() {
    let nameless = LineItem {
        name: String::new(),
        quantity: 1,
        unit_price: 0.0,
        source: ItemSource::Catalog { product_id: 1 },
    };
    assert_eq!(encode(&nameless), Err(CodecError::InvalidName));
    assert_eq!(prepare_for_save(&[nameless]), Err(CodecError::InvalidName));

    let empty = LineItem::custom("X", 0, 0.0);
    assert_eq!(encode(&empty), Err(CodecError::InvalidQuantity(0)));
    assert!(prepare_for_save(&[LineItem::custom("Ok", 1, 1.0), empty]).is_err());
}

#[test]
fn test_save_payload_serialization() {
    let saved = prepare_for_save(&[LineItem::custom("Cake", 1, 30.0)]).unwrap();
    let json = serde_json::to_value(&saved).unwrap();
    assert_eq!(json["content_items"][0], "1 Cake [30]");
    assert_eq!(json["price"], 30);
}

#[test]
fn test_names_with_edge_characters() {
    let catalog = vec![CatalogProduct::new(1, "Chair", 8.0)];

    let padded = LineItem::custom("\u{a0} Té helado  ", 2, 3.0);
    let decoded = decode(&encode(&padded).unwrap(), &catalog).unwrap();
    assert_eq!(decoded.name, "Té helado");

    let arabic_digits = LineItem::custom("Caja \u{663}\u{664}", 1, 2.0);
    let decoded = decode(&encode(&arabic_digits).unwrap(), &catalog).unwrap();
    assert_eq!(decoded.name, "Caja \u{663}\u{664}");
    assert_eq!(decoded.unit_price, 2.0);

    let separated = LineItem::custom("Mesa\u{2028}Dulce", 1, 2.0);
    let decoded = decode(&encode(&separated).unwrap(), &catalog).unwrap();
    assert_eq!(decoded.name, "Mesa\u{2028}Dulce");

    for name in ["Mesa\nDulce", "Mesa\rDulce", "Nul\u{0}", "Bell\u{7}"] {
        assert_eq!(encode(&LineItem::custom(name, 1, 1.0)), Err(CodecError::InvalidName));
    }
}

#[test]
fn test_catalog_rows_are_repriced_before_save() {
    let catalog = vec![CatalogProduct::new(1, "Tent", 100.0)];
    let rows = vec![LineItem {
        name: "tent".to_string(),
        quantity: 2,
        unit_price: 0.01,
        source: ItemSource::Catalog { product_id: 1 },
    }];

    let saved = prepare_for_save(&resolve_catalog_items(&rows, &catalog).unwrap()).unwrap();
    assert_eq!(saved.content_items, vec!["2 Tent".to_string()]);
    assert_eq!(saved.price, 200);

    assert_eq!(
        resolve_catalog_items(&rows, &[]),
        Err(CodecError::UnknownProduct(1))
    );
}

/// Any printable name that is not blank.
fn item_name() -> impl Strategy<Value = String> {
    "\\PC{1,20}".prop_filter("blank name", |name| !name.trim().is_empty())
}

proptest! {
    #[test]
    fn prop_catalog_item_round_trips(name in item_name(), cents in 0u32..1_000_000, quantity in 1i64..10_000) {
        let product = CatalogProduct::new(42, name, f64::from(cents) / 100.0);
        let item = LineItem::catalog(&product, quantity);

        match encode(&item) {
            Ok(encoded) => {
                let decoded = decode(&encoded, std::slice::from_ref(&product));
                prop_assert_eq!(decoded, Some(item));
            }
            // Only names that end in a bracketed number are refused.
            Err(CodecError::AmbiguousName(_)) => {
                prop_assert!(product.name.trim_end().ends_with(']'));
            }
            Err(e) => {
                prop_assert!(false, "unexpected error: {}", e);
            }
        }
    }

    #[test]
    fn prop_custom_item_round_trips(name in item_name(), cents in 0u32..1_000_000, quantity in 1i64..10_000) {
        let catalog = vec![CatalogProduct::new(1, "Reserved product", 1.0)];
        prop_assume!(name.trim().to_lowercase() != "reserved product");

        let item = LineItem::custom(name.clone(), quantity, f64::from(cents) / 100.0);
        let decoded = decode(&encode(&item).unwrap(), &catalog).unwrap();

        prop_assert_eq!(decoded.name, name.trim());
        prop_assert_eq!(decoded.quantity, quantity);
        prop_assert_eq!(decoded.unit_price, item.unit_price);
        prop_assert!(decoded.source == ItemSource::Custom { local_id: catering_bundles::codec::custom_slug(&name) }, "decoded source should be Custom with the slug of the name");
    }
}
