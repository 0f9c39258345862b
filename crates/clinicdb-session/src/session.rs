//! One user's search: snapshot, parser, controller and edit coalescing.
//!
//! Facet edits go through [`SearchSession::queue_edit`] and reach the
//! controller only once their channel has been quiet for the configured
//! delay. The session keeps a draft spec with queued edits already applied so
//! a caller can render slider positions before the emission lands. A new
//! query flushes queued edits into the controller first and drops only those
//! on facets the parse overwrites. Commands that replace facets wholesale (a
//! deep link, reset) drop every queued edit.

use std::time::Duration;

use tracing::{debug, info};

use clinicdb_core::config::{Config, SearchSettings};
use clinicdb_core::data_loader::Snapshot;
use clinicdb_core::error::Result;
use clinicdb_core::types::{FilterSpec, ProviderRecord, SearchField, SortKey, TextSearch};
use clinicdb_engine::{sort_records, suggest, AppliedFilter, FilterEngine, Paginator, Suggestion};
use clinicdb_query::{DeepLink, ParsedQuery, QueryParser};

use crate::controller::{EditChannel, FacetEdit, FilterStateController};
use crate::debounce::Coalescer;

fn overwritten_by(parsed: &ParsedQuery, channel: EditChannel) -> bool {
    match channel {
        EditChannel::Price(facet) => parsed.services.contains_key(&facet),
        EditChannel::Rating => parsed.rating.is_some(),
        EditChannel::Cities => !parsed.locations.is_empty(),
    }
}

/// Everything the presentation layer needs to render one result page.
#[derive(Debug, Clone)]
pub struct SearchView<'a> {
    pub items: Vec<&'a ProviderRecord>,
    pub page: usize,
    pub total_results: usize,
    pub total_pages: usize,
    pub sort: SortKey,
    /// Parser interpretation of the last query, or the applied-filter summary
    /// once the state has moved on from it.
    pub interpretation: String,
    pub applied: Vec<AppliedFilter>,
}

pub struct SearchSession {
    snapshot: Snapshot,
    parser: QueryParser,
    paginator: Paginator,
    controller: FilterStateController,
    edits: Coalescer<EditChannel, FacetEdit>,
    draft: FilterSpec,
}

impl SearchSession {
    pub fn new(snapshot: Snapshot, parser: QueryParser, settings: &SearchSettings) -> Result<Self> {
        Ok(Self {
            snapshot,
            parser,
            paginator: Paginator::new(settings.page_size)?,
            controller: FilterStateController::new(),
            edits: Coalescer::new(Duration::from_millis(settings.debounce_ms)),
            draft: FilterSpec::new(),
        })
    }

    /// Loads the snapshot from `data.dir` and applies the search and parser settings.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let dir = config.data_dir()?;
        info!(dir = %dir.display(), "loading snapshot");
        let snapshot = Snapshot::from_dir(&dir)?;
        let parser = QueryParser::with_cheap_thresholds(&config.parser_settings()?.cheap_thresholds);
        Ok(Self::new(snapshot, parser, &config.search_settings()?)?)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn controller(&self) -> &FilterStateController {
        &self.controller
    }

    /// Controller spec with queued edits applied.
    pub fn draft(&self) -> &FilterSpec {
        &self.draft
    }

    fn sync_draft(&mut self) {
        self.edits.cancel_all();
        self.draft = self.controller.spec().clone();
    }

    /// Parses `text` and applies it. Queued edits land first, except those on
    /// a facet the parse populates.
    pub fn search_text(&mut self, text: &str) -> ParsedQuery {
        let parsed = self.parser.parse(text);
        debug!(confidence = %parsed.confidence, interpretation = %parsed.interpretation, "query parsed");
        for (channel, edit) in self.edits.drain() {
            if overwritten_by(&parsed, channel) {
                debug!(?channel, "queued edit overwritten by query");
            } else {
                self.controller.apply_edit(&edit);
            }
        }
        self.controller.apply_parsed(&parsed);
        self.draft = self.controller.spec().clone();
        parsed
    }

    /// Queues a facet edit; it reaches the controller via [`Self::next_emission`].
    /// Must be called from within a tokio runtime.
    pub fn queue_edit(&mut self, edit: FacetEdit) {
        self.draft = edit.apply_to(self.draft.clone());
        self.edits.schedule(edit.channel(), edit);
    }

    /// Adds or removes a city against the draft, so quick toggles accumulate.
    pub fn toggle_city(&mut self, city: &str) {
        let mut cities = self.draft.cities().to_vec();
        let before = cities.len();
        cities.retain(|c| !c.eq_ignore_ascii_case(city.trim()));
        if cities.len() == before {
            cities.push(city.trim().to_string());
        }
        self.queue_edit(FacetEdit::Cities(cities));
    }

    /// Waits for the next settled edit and applies it. `None` when nothing is queued.
    pub async fn next_emission(&mut self) -> Option<EditChannel> {
        let (channel, edit) = self.edits.next().await?;
        self.controller.apply_edit(&edit);
        Some(channel)
    }

    pub fn pending_edits(&self) -> usize {
        self.edits.pending()
    }

    fn set_search_state(&mut self, search: Option<TextSearch>) -> bool {
        let changed = match search.clone() {
            Some(search) => self.controller.set_search(search),
            None => self.controller.clear_search(),
        };
        self.draft = self.draft.clone().with_search(search);
        changed
    }

    pub fn select_suggestion(&mut self, field: SearchField, value: &str) -> bool {
        self.set_search_state(Some(TextSearch::exact(value, field)))
    }

    pub fn clear_search(&mut self) -> bool {
        self.set_search_state(None)
    }

    pub fn set_sort(&mut self, sort: SortKey) -> bool {
        self.controller.set_sort(sort)
    }

    pub fn set_page(&mut self, page: usize) -> bool {
        self.controller.set_page(page)
    }

    pub fn reset(&mut self) -> bool {
        let changed = self.controller.reset();
        self.sync_draft();
        changed
    }

    pub fn suggestions(&self, term: &str, limit: usize) -> Vec<Suggestion> {
        suggest(&self.snapshot.providers, &self.snapshot.catalog, term, limit)
    }

    /// Filters, sorts and paginates the snapshot for the current state.
    pub fn view(&self) -> SearchView<'_> {
        let engine = FilterEngine::new(&self.snapshot.catalog);
        let outcome = engine.apply(&self.snapshot.providers, self.controller.spec());
        let sorted = sort_records(&outcome.records, self.controller.sort());
        let page = self.paginator.page(&sorted, self.controller.page());
        let interpretation = self
            .controller
            .interpretation()
            .map_or_else(|| outcome.explanation(), str::to_string);
        SearchView {
            items: page.items.to_vec(),
            page: page.page,
            total_results: page.total_results,
            total_pages: page.total_pages,
            sort: self.controller.sort(),
            interpretation,
            applied: outcome.applied,
        }
    }

    pub fn deep_link(&self) -> String {
        DeepLink::from_spec(self.controller.query(), self.controller.spec()).encode()
    }

    /// Restores the state a shared link describes. Never fails; a malformed
    /// link restores whatever part of it could be read.
    pub fn open_deep_link(&mut self, query_string: &str) -> bool {
        let link = DeepLink::decode(query_string);
        let changed = self.controller.restore(&link.query, link.to_spec());
        self.sync_draft();
        changed
    }
}
