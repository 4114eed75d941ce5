//! Command behaviour against fixtures and in-memory services

use kite_api::CachePolicy;
use kite_cli::commands::{compose_files, delete_design, list_designs, show_product};
use kite_cli::ListOptions;
use kite_core::EditorConfig;
use kite_model::{AppliedColors, DesignId, ProductId};
use kite_test_utils::{blue, kite_product, manufacturer, saved_design, FakeCatalog, FakeStorage};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn scratch_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn compose_writes_one_file_per_variation() {
    let scratch = scratch_dir();
    let dir = scratch.path();
    let product_path = dir.join("product.json");
    let colors_path = dir.join("colors.json");
    let out_dir = dir.join("out");

    let mut applied = AppliedColors::new();
    applied.assign("front", "p2", blue());
    std::fs::write(&product_path, serde_json::to_string(&kite_product()).unwrap()).unwrap();
    std::fs::write(&colors_path, serde_json::to_string(&applied).unwrap()).unwrap();

    let mut out: Vec<u8> = Vec::new();
    let written = compose_files(
        &product_path,
        &colors_path,
        &out_dir,
        &EditorConfig::default(),
        &mut out,
    )
    .unwrap();

    assert_eq!(written, [out_dir.join("front.svg"), out_dir.join("back.svg")]);
    let front = std::fs::read_to_string(&written[0]).unwrap();
    assert!(front.contains(r##"data-id="p2" fill="#0000ff""##));
    let report = String::from_utf8(out).unwrap();
    assert!(report.starts_with("front (primary) -> "));
}

#[test]
fn compose_rejects_unknown_variation() {
    let scratch = scratch_dir();
    let dir = scratch.path();
    let product_path = dir.join("product.json");
    let colors_path = dir.join("colors.json");

    let mut applied = AppliedColors::new();
    applied.assign("side", "p1", blue());
    std::fs::write(&product_path, serde_json::to_string(&kite_product()).unwrap()).unwrap();
    std::fs::write(&colors_path, serde_json::to_string(&applied).unwrap()).unwrap();

    let result = compose_files(
        &product_path,
        &colors_path,
        &dir.join("out"),
        &EditorConfig::default(),
        &mut Vec::<u8>::new(),
    );
    assert!(result.is_err());
    assert!(!dir.join("out").exists());
}

#[tokio::test]
async fn product_summary_lists_colors_and_variations() {
    let catalog = FakeCatalog::new()
        .with_product(kite_product())
        .with_manufacturer(manufacturer("m1", "Ozone"));

    let mut out: Vec<u8> = Vec::new();
    show_product(&catalog, &ProductId::new("kite"), &mut out)
        .await
        .unwrap();

    let report = String::from_utf8(out).unwrap();
    assert!(report.starts_with("Kite (kite)\n  manufacturer: Ozone\n"));
    assert!(report.contains("Blue"));
    assert!(report.contains("    back\n"));
}

#[tokio::test]
async fn designs_listing_honours_limit_and_privacy() {
    let storage = FakeStorage::new().with_designs((1..=4).map(|i| saved_design(&i.to_string(), "kite")));

    let mut out: Vec<u8> = Vec::new();
    let count = list_designs(
        &storage,
        ListOptions {
            limit: 3,
            include_private: true,
            cache: CachePolicy::Bypass,
        },
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(count, 3);
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
    let filter = &storage.listings()[0];
    assert!(!filter.public_only);
    assert_eq!(filter.limit.count, 3);
}

#[tokio::test]
async fn delete_reports_rejection() {
    let storage = FakeStorage::new().with_designs([saved_design("1", "kite")]);

    let mut out: Vec<u8> = Vec::new();
    delete_design(&storage, &DesignId::new("1"), &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "deleted design 1\n");

    let err = delete_design(&storage, &DesignId::new("1"), &mut Vec::<u8>::new())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("deleting design 1"));
}
