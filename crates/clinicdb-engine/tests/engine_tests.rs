use proptest::prelude::*;

use clinicdb_core::catalog::ServiceCatalog;
use clinicdb_core::types::{
    FilterSpec, NumericRange, PriceFacet, ProviderRecord, SearchField, ServiceDefinition, SortKey, TextSearch,
};
use clinicdb_engine::{sort_records, AppliedFilter, FilterEngine, Paginator, DEFAULT_PAGE_SIZE};

fn catalog() -> ServiceCatalog {
    ServiceCatalog::new(vec![
        ServiceDefinition::new("wellness", "Wellness", None, 1),
        ServiceDefinition::new("wellness.exam", "Wellness Exam", Some("wellness"), 2),
        ServiceDefinition::new("wellness.vaccine", "Vaccinations", Some("wellness"), 3),
        ServiceDefinition::new("surgery", "Surgery", None, 4),
        ServiceDefinition::new("surgery.spay", "Spay", Some("surgery"), 5),
        // Dotted prefix says wellness, parent says surgery.
        ServiceDefinition::new("wellness.dental", "Dental Surgery", Some("surgery"), 6),
    ])
    .expect("valid catalog")
}

fn records() -> Vec<ProviderRecord> {
    vec![
        ProviderRecord::new("1", "Kitsilano Animal Hospital", "Vancouver")
            .with_province("BC")
            .with_address("2100 W 4th Ave")
            .with_service("wellness.exam")
            .with_service("wellness.vaccine")
            .with_price(PriceFacet::Exam, 75.0)
            .with_price(PriceFacet::Vaccine, 45.0)
            .with_rating(4.6, 120),
        ProviderRecord::new("2", "Burnaby Pet Clinic", "Burnaby")
            .with_province("BC")
            .with_service("surgery.spay")
            .with_price(PriceFacet::Exam, 95.0)
            .with_price(PriceFacet::Spay, 450.0)
            .with_rating(3.9, 40),
        ProviderRecord::new("3", "Lonsdale Vets", "North Vancouver")
            .with_province("BC")
            .with_service("wellness.dental")
            .with_price(PriceFacet::Exam, f64::NAN),
        ProviderRecord::new("4", "Main Street Animal Care", "vancouver")
            .with_province("BC")
            .with_price(PriceFacet::Exam, 60.0)
            .with_rating(4.1, 8),
    ]
}

fn ids(records: &[&ProviderRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

#[test]
fn exam_ceiling_excludes_missing_and_nan() {
    let catalog = catalog();
    let data = records();
    let spec = FilterSpec::new().with_price(PriceFacet::Exam, Some(NumericRange::at_most(80.0)));
    let outcome = FilterEngine::new(&catalog).apply(&data, &spec);
    assert_eq!(ids(&outcome.records), vec!["1", "4"]);
    assert_eq!(outcome.applied, vec![AppliedFilter::Price(PriceFacet::Exam, NumericRange::at_most(80.0))]);
    assert_eq!(outcome.explanation(), "exam price: up to $80");
}

#[test]
fn unbounded_range_requires_a_price() {
    let catalog = catalog();
    let data = records();
    let spec = FilterSpec::new().with_price(PriceFacet::Spay, Some(NumericRange::unbounded()));
    assert_eq!(ids(&FilterEngine::new(&catalog).apply(&data, &spec).records), vec!["2"]);
}

#[test]
fn rating_and_city_are_anded() {
    let catalog = catalog();
    let data = records();
    let spec = FilterSpec::new()
        .with_rating(Some(NumericRange::between(4.0, 5.0)))
        .with_cities(["VANCOUVER"]);
    assert_eq!(ids(&FilterEngine::new(&catalog).apply(&data, &spec).records), vec!["1", "4"]);
}

#[test]
fn inverted_range_matches_nothing() {
    let catalog = catalog();
    let data = records();
    let spec = FilterSpec::new().with_price(PriceFacet::Exam, Some(NumericRange::new(Some(100.0), Some(10.0))));
    let outcome = FilterEngine::new(&catalog).apply(&data, &spec);
    assert!(outcome.records.is_empty());
    assert!(outcome.explanation().contains("matches nothing"));
}

#[test]
fn fuzzy_search_covers_fields_and_services() {
    let catalog = catalog();
    let data = records();
    let engine = FilterEngine::new(&catalog);
    let search = |term: &str| {
        let spec = FilterSpec::new().with_search(Some(TextSearch::fuzzy(term)));
        ids(&engine.apply(&data, &spec).records)
    };
    assert_eq!(search("animal"), vec!["1", "4"]);
    assert_eq!(search("4th ave"), vec!["1"]);
    assert_eq!(search("vaccinations"), vec!["1"]);
    assert_eq!(search("north van"), vec!["3"]);
}

#[test]
fn category_uses_parent_reference_not_prefix() {
    let catalog = catalog();
    let data = records();
    let engine = FilterEngine::new(&catalog);
    let spec = FilterSpec::new().with_search(Some(TextSearch::exact("Surgery", SearchField::Category)));
    assert_eq!(ids(&engine.apply(&data, &spec).records), vec!["2", "3"]);
    let spec = FilterSpec::new().with_search(Some(TextSearch::exact("wellness", SearchField::Category)));
    assert_eq!(ids(&engine.apply(&data, &spec).records), vec!["1"]);
}

#[test]
fn exact_search_is_never_broader_than_fuzzy() {
    let catalog = catalog();
    let data = records();
    let engine = FilterEngine::new(&catalog);
    for field in SearchField::ALL {
        for term in ["vancouver", "Spay", "BC", "Burnaby Pet Clinic", "wellness"] {
            let exact = FilterSpec::new().with_search(Some(TextSearch::exact(term, field)));
            let fuzzy = FilterSpec::new().with_search(Some(TextSearch::fuzzy(term)));
            let fuzzy_ids = ids(&engine.apply(&data, &fuzzy).records);
            for id in ids(&engine.apply(&data, &exact).records) {
                assert!(fuzzy_ids.contains(&id), "{field} {term}");
            }
        }
    }
}

#[test]
fn exact_city_does_not_match_north_vancouver() {
    let catalog = catalog();
    let data = records();
    let spec = FilterSpec::new().with_search(Some(TextSearch::exact("Vancouver", SearchField::City)));
    assert_eq!(ids(&FilterEngine::new(&catalog).apply(&data, &spec).records), vec!["1", "4"]);
}

#[test]
fn name_sort_prefers_complete_records() {
    let data = records();
    let refs: Vec<&ProviderRecord> = data.iter().collect();
    // 1 and 2 carry two prices, 4 one, 3 none (NaN is not a price).
    assert_eq!(ids(&sort_records(&refs, SortKey::NameAsc)), vec!["2", "1", "4", "3"]);
    assert_eq!(ids(&sort_records(&refs, SortKey::NameDesc)), vec!["1", "2", "4", "3"]);
}

#[test]
fn city_sort_keeps_ties_in_input_order() {
    let data = records();
    let refs: Vec<&ProviderRecord> = data.iter().collect();
    assert_eq!(ids(&sort_records(&refs, SortKey::CityAsc)), vec!["2", "3", "1", "4"]);
    let reversed: Vec<&ProviderRecord> = data.iter().rev().collect();
    assert_eq!(ids(&sort_records(&reversed, SortKey::CityAsc)), vec!["2", "3", "4", "1"]);
    assert_eq!(ids(&sort_records(&refs, SortKey::CityDesc)), vec!["1", "4", "3", "2"]);
}

#[test]
fn price_and_rating_sorts() {
    let data = records();
    let refs: Vec<&ProviderRecord> = data.iter().collect();
    assert_eq!(ids(&sort_records(&refs, SortKey::LowestPrice(PriceFacet::Exam))), vec!["4", "1", "2", "3"]);
    assert_eq!(ids(&sort_records(&refs, SortKey::LowestPrice(PriceFacet::Spay))), vec!["2", "1", "3", "4"]);
    assert_eq!(ids(&sort_records(&refs, SortKey::HighestRating)), vec!["1", "4", "2", "3"]);
}

#[test]
fn pages_outside_range_are_empty() {
    let paginator = Paginator::default();
    assert_eq!(paginator.page_size(), DEFAULT_PAGE_SIZE);
    let items: Vec<u32> = (0..30).collect();
    assert_eq!(paginator.total_pages(items.len()), 3);

    let last = paginator.page(&items, 3);
    assert_eq!(last.items, &items[24..]);
    assert!(!last.has_next());

    for page in [0, 4, 100] {
        let out = paginator.page(&items, page);
        assert!(out.is_empty());
        assert_eq!(out.total_results, 30);
        assert_eq!(out.total_pages, 3);
    }
    assert_eq!(paginator.page::<u32>(&[], 1).total_pages, 0);
    assert!(Paginator::new(0).is_err());
}

fn record_strategy() -> impl Strategy<Value = ProviderRecord> {
    (
        "[a-z]{1,6}",
        prop::sample::select(vec!["Vancouver", "Burnaby", "Surrey", "Richmond"]),
        prop::option::of(0.0f64..600.0),
        prop::option::of(0.0f64..5.0),
    )
        .prop_map(|(name, city, exam, rating)| {
            let mut record = ProviderRecord::new(name.clone(), name, city);
            if let Some(exam) = exam {
                record = record.with_price(PriceFacet::Exam, exam);
            }
            if let Some(rating) = rating {
                record = record.with_rating(rating, 1);
            }
            record
        })
}

fn sort_key_strategy() -> impl Strategy<Value = SortKey> {
    prop::sample::select(SortKey::all())
}

proptest! {
    #[test]
    fn prop_filter_is_idempotent(
        data in prop::collection::vec(record_strategy(), 0..30),
        max in 0.0f64..600.0,
        min_rating in 0.0f64..5.0,
    ) {
        let catalog = catalog();
        let engine = FilterEngine::new(&catalog);
        let spec = FilterSpec::new()
            .with_price(PriceFacet::Exam, Some(NumericRange::at_most(max)))
            .with_rating(Some(NumericRange::at_least(min_rating)));
        let once = engine.apply(&data, &spec).records;
        let twice = engine.apply(once.iter().copied(), &spec).records;
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_inverted_range_is_empty(
        data in prop::collection::vec(record_strategy(), 0..30),
        lo in 1.0f64..600.0,
        gap in 0.01f64..100.0,
    ) {
        let catalog = catalog();
        let spec = FilterSpec::new().with_price(PriceFacet::Exam, Some(NumericRange::new(Some(lo + gap), Some(lo))));
        prop_assert!(FilterEngine::new(&catalog).apply(&data, &spec).records.is_empty());
    }

    #[test]
    fn prop_sort_is_stable(data in prop::collection::vec(record_strategy(), 0..30), key in sort_key_strategy()) {
        let refs: Vec<&ProviderRecord> = data.iter().collect();
        let sorted = sort_records(&refs, key);
        prop_assert_eq!(sorted.len(), refs.len());
        for pair in sorted.windows(2) {
            let order = clinicdb_engine::compare(key, pair[0], pair[1]);
            prop_assert!(order != std::cmp::Ordering::Greater);
            if order == std::cmp::Ordering::Equal {
                let a = refs.iter().position(|r| std::ptr::eq(*r, pair[0]));
                let b = refs.iter().position(|r| std::ptr::eq(*r, pair[1]));
                prop_assert!(a < b);
            }
        }
    }

    #[test]
    fn prop_pagination_is_complete(len in 0usize..200, size in 1usize..25) {
        let items: Vec<usize> = (0..len).collect();
        let paginator = Paginator::new(size).expect("non-zero size");
        let pages = paginator.total_pages(len);
        prop_assert_eq!(pages, len.div_ceil(size));
        let mut seen = Vec::new();
        for page in 1..=pages {
            let out = paginator.page(&items, page);
            prop_assert!(!out.items.is_empty());
            prop_assert!(out.items.len() <= size);
            seen.extend_from_slice(out.items);
        }
        prop_assert_eq!(seen, items);
    }
}
