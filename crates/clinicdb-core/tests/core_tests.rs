use std::fs;
use tempfile::TempDir;

use clinicdb_core::config::Config;
use clinicdb_core::data_loader::{Snapshot, PROVIDERS_FILE, SERVICES_FILE};
use clinicdb_core::types::{FilterSpec, NumericRange, PriceFacet, SortKey};

const SERVICES: &str = r#"[
  {"code": "vaccine", "name": "Vaccinations", "parent": null, "position": 1},
  {"code": "vaccine.rabies", "name": "Rabies Vaccine", "parent": "vaccine", "position": 2}
]"#;

const PROVIDERS: &str = r#"[
  {"id": "c1", "name": "Kits Animal Hospital", "city": "Vancouver", "province": "BC",
   "address": "2000 W 4th Ave", "services": ["vaccine.rabies"],
   "prices": {"exam": 75.0, "vaccine": -3.0}, "rating": 4.6},
  {"id": "c2", "name": "Harbour Vet", "city": "North Vancouver", "rating": 9.5, "review_count": 12}
]"#;

#[test]
fn snapshot_from_dir_sanitizes_records() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(SERVICES_FILE), SERVICES).unwrap();
    fs::write(tmp.path().join(PROVIDERS_FILE), PROVIDERS).unwrap();

    let snapshot = Snapshot::from_dir(tmp.path()).expect("load snapshot");
    assert_eq!(snapshot.providers.len(), 2);
    assert_eq!(snapshot.catalog.len(), 2);

    let kits = &snapshot.providers[0];
    assert_eq!(kits.price(PriceFacet::Exam), Some(75.0));
    assert_eq!(kits.price(PriceFacet::Vaccine), None, "negative price dropped");
    assert_eq!(kits.review_count(), Some(0), "rated clinic defaults to zero reviews");

    let harbour = &snapshot.providers[1];
    assert_eq!(harbour.rating(), None, "rating above 5 dropped");
    assert_eq!(harbour.completeness(), 0);
}

#[test]
fn snapshot_rejects_dangling_parent() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(SERVICES_FILE),
        r#"[{"code": "dental.clean", "name": "Cleaning", "parent": "dental"}]"#,
    )
    .unwrap();
    fs::write(tmp.path().join(PROVIDERS_FILE), "[]").unwrap();
    assert!(Snapshot::from_dir(tmp.path()).is_err());
}

#[test]
fn snapshot_missing_files_is_an_error() {
    let tmp = TempDir::new().unwrap();
    assert!(Snapshot::from_dir(tmp.path()).is_err());
}

#[test]
fn config_defaults_without_files() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path(), "test").expect("config");
    let search = config.search_settings().expect("search settings");
    assert_eq!(search.page_size, 12);
    assert_eq!(search.debounce_ms, 300);
    assert!(config.parser_settings().expect("parser").cheap_thresholds.is_empty());
    assert_eq!(config.data_dir().expect("data dir"), tmp.path().join("data"));
}

#[test]
fn config_env_overlay_and_thresholds() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[search]\npage_size = 20\n\n[data]\ndir = \"/srv/clinics\"\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("config.test.toml"),
        "[search]\ndebounce_ms = 50\n\n[parser.cheap_thresholds]\nvaccine = 45.0\n",
    )
    .unwrap();
    let config = Config::load_from(tmp.path(), "test").expect("config");
    let search = config.search_settings().expect("search settings");
    assert_eq!(search.page_size, 20);
    assert_eq!(search.debounce_ms, 50);
    assert_eq!(config.data_dir().expect("data dir"), std::path::PathBuf::from("/srv/clinics"));
    let parser = config.parser_settings().expect("parser");
    assert_eq!(parser.cheap_thresholds.get(&PriceFacet::Vaccine), Some(&45.0));
}

#[test]
fn config_rejects_zero_page_size() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[search]\npage_size = 0\n").unwrap();
    assert!(Config::load_from(tmp.path(), "dev").is_err());
}

#[test]
fn filter_spec_builders_normalize_cities() {
    let spec = FilterSpec::new()
        .with_cities(["Vancouver", " vancouver ", "", "Burnaby"])
        .with_price(PriceFacet::Exam, Some(NumericRange::at_most(80.0)));
    assert_eq!(spec.cities(), ["Vancouver", "Burnaby"]);
    assert_eq!(spec.active_facet_count(), 2);
    let cleared = spec.with_price(PriceFacet::Exam, None).with_cities(Vec::<String>::new());
    assert!(cleared.is_unrestricted());
}

#[test]
fn numeric_range_policies() {
    assert!(NumericRange::at_most(80.0).contains(Some(80.0)));
    assert!(!NumericRange::at_most(80.0).contains(None));
    assert!(!NumericRange::unbounded().contains(Some(f64::NAN)));
    assert_eq!(NumericRange::between(800.0, 500.0), NumericRange::new(Some(500.0), Some(800.0)));
    let inverted = NumericRange::new(Some(10.0), Some(5.0));
    assert!(!inverted.contains(Some(7.0)));
}

#[test]
fn sort_keys_round_trip_through_strings() {
    for key in SortKey::all() {
        assert_eq!(key.to_string().parse::<SortKey>().unwrap(), key);
    }
    assert!("price-grooming".parse::<SortKey>().is_err());
}
