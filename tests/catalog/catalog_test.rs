//! Catalog loading, validation and partitioning.

use std::fs;

use phone_recommender::catalog::{Catalog, CatalogError};

fn product_json(id: u32, price: f64, rating: f64) -> String {
    format!(
        r#"{{"id":{id},"name":"Phone {id}","brand":"Acme","price":{price},
            "specs":{{"ram":"8GB","storage":"128GB","battery":"5000 mAh","processor":"X1"}},
            "rating":{rating}}}"#
    )
}

fn catalog_json(entries: &[String]) -> String {
    format!("[{}]", entries.join(","))
}

#[test]
fn builtin_catalog_has_twelve_unique_products() {
    let catalog = Catalog::builtin().expect("bundled catalog should parse");
    assert_eq!(catalog.len(), 12);
    assert!(!catalog.is_empty());

    let mut ids: Vec<u32> = catalog.products().iter().map(|p| p.id).collect();
    ids.dedup();
    assert_eq!(ids, (1..=12).collect::<Vec<u32>>());
}

#[test]
fn builtin_products_carry_hardware_details() {
    let catalog = Catalog::builtin().expect("bundled catalog should parse");
    let oneplus = catalog.get(4).expect("product 4 should exist");
    assert_eq!(oneplus.name, "OnePlus 12");
    assert_eq!(oneplus.brand, "OnePlus");
    assert!((oneplus.price - 799.0).abs() < f64::EPSILON);
    assert_eq!(oneplus.specs.ram, "16GB");
    assert_eq!(oneplus.specs.battery, "5400 mAh");
    assert_eq!(oneplus.specs.processor, "Snapdragon 8 Gen 3");
    assert!(oneplus.image.is_some());
}

#[test]
fn image_is_optional() {
    let catalog = Catalog::from_json(&catalog_json(&[product_json(1, 100.0, 4.0)]))
        .expect("catalog without images should parse");
    assert!(catalog.products()[0].image.is_none());
}

#[test]
fn rejects_duplicate_ids() {
    let json = catalog_json(&[product_json(3, 100.0, 4.0), product_json(3, 200.0, 4.0)]);
    let err = Catalog::from_json(&json).expect_err("duplicate ids should be rejected");
    assert!(matches!(err, CatalogError::DuplicateId(3)));
}

#[test]
fn rejects_non_positive_price() {
    let json = catalog_json(&[product_json(1, 0.0, 4.0)]);
    let err = Catalog::from_json(&json).expect_err("zero price should be rejected");
    assert!(matches!(err, CatalogError::InvalidProduct { id: 1, .. }));
}

#[test]
fn rejects_rating_out_of_range() {
    let json = catalog_json(&[product_json(2, 100.0, 5.5)]);
    let err = Catalog::from_json(&json).expect_err("rating above 5 should be rejected");
    assert!(matches!(err, CatalogError::InvalidProduct { id: 2, .. }));
}

#[test]
fn empty_catalog_is_valid() {
    let catalog = Catalog::from_json("[]").expect("empty catalog should load");
    assert!(catalog.is_empty());
    assert_eq!(catalog.len(), 0);
    assert!(!catalog.contains(1));

    let (recommended, others) = catalog.partition(&[1, 2]);
    assert!(recommended.is_empty());
    assert!(others.is_empty());
}

#[test]
fn rejects_schema_mismatch() {
    let err = Catalog::from_json(r#"[{"id":1}]"#).expect_err("missing fields should fail");
    assert!(matches!(err, CatalogError::Json(_)));
}

#[test]
fn loads_catalog_from_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("catalog.json");
    let write = fs::write(
        &path,
        catalog_json(&[product_json(7, 449.0, 4.3), product_json(9, 399.0, 4.2)]),
    );
    assert!(write.is_ok());

    let catalog = Catalog::load(&path).expect("catalog file should load");
    assert_eq!(catalog.len(), 2);
    assert!(catalog.contains(7));
    assert!(catalog.contains(9));
    assert!(!catalog.contains(8));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let err = Catalog::load(&dir.path().join("absent.json")).expect_err("missing file");
    assert!(matches!(err, CatalogError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn partition_follows_ranking_and_keeps_rest_in_catalog_order() {
    let catalog = Catalog::builtin().expect("bundled catalog should parse");
    let (recommended, others) = catalog.partition(&[7, 4, 7, 99]);

    let recommended_ids: Vec<u32> = recommended.iter().map(|p| p.id).collect();
    assert_eq!(recommended_ids, vec![7, 4]);

    let other_ids: Vec<u32> = others.iter().map(|p| p.id).collect();
    assert_eq!(other_ids, vec![1, 2, 3, 5, 6, 8, 9, 10, 11, 12]);
}

#[test]
fn partition_with_no_matches_returns_everything_as_others() {
    let catalog = Catalog::builtin().expect("bundled catalog should parse");
    let (recommended, others) = catalog.partition(&[]);
    assert!(recommended.is_empty());
    assert_eq!(others.len(), 12);
}
