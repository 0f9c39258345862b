//! Single owner of the active [`FilterSpec`] and [`SortKey`].
//!
//! State changes only through the command methods below. Any command that
//! changes the filters or the sort key resets the page to 1 and bumps the
//! revision; a command that leaves everything as it was is a no-op and
//! returns `false`.

use tracing::debug;

use clinicdb_core::types::{FilterSpec, NumericRange, PriceFacet, SearchField, SortKey, TextSearch};
use clinicdb_query::{Confidence, ParsedQuery};

/// Coalescing key for facet edits: edits on the same channel replace each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditChannel {
    Price(PriceFacet),
    Rating,
    Cities,
}

/// A direct edit of one facet, as made from a slider or checkbox list.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetEdit {
    Price(PriceFacet, Option<NumericRange>),
    Rating(Option<NumericRange>),
    Cities(Vec<String>),
}

impl FacetEdit {
    pub fn channel(&self) -> EditChannel {
        match self {
            Self::Price(facet, _) => EditChannel::Price(*facet),
            Self::Rating(_) => EditChannel::Rating,
            Self::Cities(_) => EditChannel::Cities,
        }
    }

    pub fn apply_to(&self, spec: FilterSpec) -> FilterSpec {
        match self {
            Self::Price(facet, range) => spec.with_price(*facet, *range),
            Self::Rating(range) => spec.with_rating(*range),
            Self::Cities(cities) => spec.with_cities(cities.iter().cloned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterStateController {
    spec: FilterSpec,
    sort: SortKey,
    page: usize,
    revision: u64,
    query: String,
    interpretation: Option<String>,
}

impl Default for FilterStateController {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterStateController {
    pub fn new() -> Self {
        Self {
            spec: FilterSpec::new(),
            sort: SortKey::default(),
            page: 1,
            revision: 0,
            query: String::new(),
            interpretation: None,
        }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of state changes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Raw text of the last natural-language query.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Interpretation of the last parsed query, if one was applied.
    pub fn interpretation(&self) -> Option<&str> {
        self.interpretation.as_deref()
    }

    fn commit(&mut self, spec: FilterSpec) -> bool {
        if spec == self.spec {
            return false;
        }
        self.spec = spec;
        self.page = 1;
        self.revision += 1;
        debug!(revision = self.revision, "filter spec updated");
        true
    }

    /// Overwrites only the facets the parser populated. A low-confidence parse
    /// becomes a fuzzy search over its remainder; any other parse clears the
    /// text search because its words were consumed as facets.
    pub fn apply_parsed(&mut self, parsed: &ParsedQuery) -> bool {
        let mut spec = self.spec.clone();
        for facet in parsed.services.keys() {
            spec = spec.with_price(*facet, parsed.service_range(*facet));
        }
        if parsed.rating.is_some() {
            spec = spec.with_rating(parsed.rating);
        }
        if !parsed.locations.is_empty() {
            spec = spec.with_cities(parsed.locations.iter().cloned());
        }
        let search = (parsed.confidence == Confidence::Low).then(|| TextSearch::fuzzy(parsed.remainder.clone()));
        spec = spec.with_search(search);

        self.query = parsed.original.clone();
        self.interpretation = Some(parsed.interpretation.clone());
        self.commit(spec)
    }

    /// A direct edit supersedes the interpretation of the last parsed query.
    pub fn apply_edit(&mut self, edit: &FacetEdit) -> bool {
        let spec = edit.apply_to(self.spec.clone());
        let changed = self.commit(spec);
        if changed {
            self.interpretation = None;
        }
        changed
    }

    pub fn set_search(&mut self, search: TextSearch) -> bool {
        self.query = search.term.clone();
        let spec = self.spec.clone().with_search(Some(search));
        self.commit(spec)
    }

    /// Picking a suggestion narrows the search to that field.
    pub fn select_suggestion(&mut self, field: SearchField, value: &str) -> bool {
        self.set_search(TextSearch::exact(value, field))
    }

    /// Clears the search text and mode; facets are untouched.
    pub fn clear_search(&mut self) -> bool {
        self.query.clear();
        self.interpretation = None;
        let spec = self.spec.clone().with_search(None);
        self.commit(spec)
    }

    pub fn set_sort(&mut self, sort: SortKey) -> bool {
        if sort == self.sort {
            return false;
        }
        self.sort = sort;
        self.page = 1;
        self.revision += 1;
        true
    }

    /// Any page number is accepted; out-of-range pages render empty.
    pub fn set_page(&mut self, page: usize) -> bool {
        if page == self.page {
            return false;
        }
        self.page = page;
        self.revision += 1;
        true
    }

    /// Replaces the whole state, as when opening a shared link.
    pub fn restore(&mut self, query: &str, spec: FilterSpec) -> bool {
        self.query = query.to_string();
        self.interpretation = None;
        self.commit(spec)
    }

    pub fn reset(&mut self) -> bool {
        self.query.clear();
        self.interpretation = None;
        let sort_changed = self.set_sort(SortKey::default());
        let spec_changed = self.commit(FilterSpec::new());
        let page_changed = self.set_page(1);
        sort_changed || spec_changed || page_changed
    }
}
