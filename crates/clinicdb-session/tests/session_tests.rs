use std::time::Duration;

use clinicdb_core::config::SearchSettings;
use clinicdb_core::data_loader::{InMemoryRepository, Snapshot};
use clinicdb_core::types::{
    FilterSpec, NumericRange, PriceFacet, ProviderRecord, SearchField, SearchMode, ServiceDefinition, SortKey,
};
use clinicdb_query::QueryParser;
use clinicdb_session::{EditChannel, FacetEdit, FilterStateController, SearchSession};

fn snapshot() -> Snapshot {
    let repo = InMemoryRepository {
        providers: vec![
            ProviderRecord::new("1", "Kitsilano Animal Hospital", "Vancouver")
                .with_service("wellness.vaccine")
                .with_price(PriceFacet::Exam, 75.0)
                .with_price(PriceFacet::Vaccine, 40.0)
                .with_rating(4.6, 120),
            ProviderRecord::new("2", "Burnaby Pet Clinic", "Burnaby")
                .with_price(PriceFacet::Exam, 95.0)
                .with_price(PriceFacet::Vaccine, 65.0)
                .with_rating(3.9, 40),
            ProviderRecord::new("3", "Lonsdale Vets", "North Vancouver")
                .with_price(PriceFacet::Exam, 55.0)
                .with_rating(4.2, 10),
        ],
        services: vec![
            ServiceDefinition::new("wellness", "Wellness", None, 1),
            ServiceDefinition::new("wellness.vaccine", "Vaccinations", Some("wellness"), 2),
        ],
    };
    Snapshot::load(&repo).expect("snapshot")
}

fn session(page_size: usize) -> SearchSession {
    let settings = SearchSettings { page_size, debounce_ms: 300 };
    SearchSession::new(snapshot(), QueryParser::new(), &settings).expect("session")
}

fn ids(session: &SearchSession) -> Vec<String> {
    session.view().items.iter().map(|r| r.id.clone()).collect()
}

#[test]
fn parsed_query_drives_the_view() {
    let mut session = session(12);
    let parsed = session.search_text("exam under $80");
    assert_eq!(parsed.interpretation, "exam under $80");
    let view = session.view();
    assert_eq!(view.total_results, 2);
    assert_eq!(view.interpretation, "exam under $80");
    assert_eq!(ids(&session), vec!["1", "3"]);
}

#[test]
fn parse_overwrites_only_populated_facets() {
    let mut controller = FilterStateController::new();
    let parser = QueryParser::new();
    controller.apply_parsed(&parser.parse("vaccine under $50 in Burnaby"));
    controller.apply_parsed(&parser.parse("4 star"));
    let spec = controller.spec();
    assert_eq!(spec.price(PriceFacet::Vaccine), Some(NumericRange::at_most(50.0)));
    assert_eq!(spec.cities(), ["Burnaby".to_string()]);
    assert_eq!(spec.rating(), Some(NumericRange::new(Some(4.0), Some(5.0))));
}

#[test]
fn low_confidence_becomes_fuzzy_search() {
    let mut session = session(12);
    session.search_text("kitsilano");
    let search = session.controller().spec().search().cloned().expect("search set");
    assert_eq!(search.mode, SearchMode::Fuzzy);
    assert_eq!(ids(&session), vec!["1"]);
}

#[test]
fn clear_search_keeps_facets() {
    let mut session = session(12);
    session.search_text("exam under $80");
    session.select_suggestion(SearchField::City, "Vancouver");
    assert_eq!(ids(&session), vec!["1"]);
    assert!(session.clear_search());
    assert!(session.controller().spec().search().is_none());
    assert_eq!(session.controller().spec().price(PriceFacet::Exam), Some(NumericRange::at_most(80.0)));
}

#[test]
fn sort_and_filter_changes_reset_page() {
    let mut session = session(1);
    session.set_page(3);
    assert_eq!(session.view().items.len(), 1);
    assert!(session.set_sort(SortKey::HighestRating));
    assert_eq!(session.controller().page(), 1);
    assert_eq!(ids(&session), vec!["1"]);

    session.set_page(9);
    let view = session.view();
    assert!(view.items.is_empty());
    assert_eq!(view.total_results, 3);
    assert_eq!(view.total_pages, 3);
}

#[test]
fn deep_link_restores_state() {
    let mut session = session(12);
    session.search_text("cheap vaccine in Vancouver");
    let link = session.deep_link();
    assert!(link.contains("type=nlp"));

    let mut other = self::session(12);
    assert!(other.open_deep_link(&link));
    assert_eq!(other.controller().spec(), session.controller().spec());
    assert_eq!(other.controller().query(), "cheap vaccine in Vancouver");
    assert_eq!(ids(&other), ids(&session));
}

#[test]
fn malformed_deep_link_is_unfiltered() {
    let mut session = session(12);
    session.open_deep_link("q=x&type=nlp&filters=%7Bbroken");
    assert_eq!(session.controller().spec(), &FilterSpec::new());
    assert_eq!(session.view().total_results, 3);
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_emit_once_with_final_value() {
    let mut session = session(12);
    for max in [90.0, 80.0, 70.0, 60.0] {
        session.queue_edit(FacetEdit::Price(PriceFacet::Exam, Some(NumericRange::at_most(max))));
        tokio::time::sleep(Duration::from_millis(120)).await;
    }
    assert_eq!(session.controller().revision(), 0);
    assert_eq!(session.draft().price(PriceFacet::Exam), Some(NumericRange::at_most(60.0)));

    assert_eq!(session.next_emission().await, Some(EditChannel::Price(PriceFacet::Exam)));
    assert_eq!(session.controller().revision(), 1);
    assert_eq!(session.controller().spec().price(PriceFacet::Exam), Some(NumericRange::at_most(60.0)));
    assert_eq!(session.next_emission().await, None);
    assert_eq!(ids(&session), vec!["3"]);
}

#[tokio::test(start_paused = true)]
async fn channels_coalesce_independently() {
    let mut session = session(12);
    session.queue_edit(FacetEdit::Rating(Some(NumericRange::at_least(4.0))));
    session.toggle_city("Vancouver");
    session.toggle_city("North Vancouver");
    session.toggle_city("vancouver");
    assert_eq!(session.pending_edits(), 2);

    let mut channels = vec![
        session.next_emission().await.expect("first"),
        session.next_emission().await.expect("second"),
    ];
    channels.sort_by_key(|c| matches!(c, EditChannel::Cities));
    assert_eq!(channels, vec![EditChannel::Rating, EditChannel::Cities]);
    assert_eq!(session.controller().spec().cities(), ["North Vancouver".to_string()]);
    assert_eq!(ids(&session), vec!["3"]);
}

#[tokio::test(start_paused = true)]
async fn new_query_keeps_queued_edits_on_other_facets() {
    let mut session = session(12);
    session.queue_edit(FacetEdit::Rating(Some(NumericRange::at_least(4.0))));
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.search_text("exam under $100");
    assert_eq!(session.pending_edits(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.next_emission().await, None);
    let spec = session.controller().spec();
    assert_eq!(spec.rating(), Some(NumericRange::at_least(4.0)));
    assert_eq!(spec.price(PriceFacet::Exam), Some(NumericRange::at_most(100.0)));
    assert_eq!(session.draft(), spec);
    assert_eq!(session.view().interpretation, "exam under $100");
    assert_eq!(ids(&session), vec!["1", "3"]);
}

#[tokio::test(start_paused = true)]
async fn new_query_overrides_queued_edit_on_same_facet() {
    let mut session = session(12);
    session.queue_edit(FacetEdit::Price(PriceFacet::Vaccine, Some(NumericRange::at_most(10.0))));
    session.toggle_city("Burnaby");
    session.search_text("vaccine under $50");
    assert_eq!(session.pending_edits(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.next_emission().await, None);
    let spec = session.controller().spec();
    assert_eq!(spec.price(PriceFacet::Vaccine), Some(NumericRange::at_most(50.0)));
    assert_eq!(spec.cities(), ["Burnaby".to_string()]);
    assert_eq!(session.controller().revision(), 2);
}
