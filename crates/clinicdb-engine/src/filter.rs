//! Facet and text filtering over the provider snapshot.
//!
//! Missing-data policy: a record with no finite value for a facet fails that
//! facet's range whenever the range is active. This holds for all four price
//! facets and the rating. An inverted range (`min > max`) matches nothing.

use std::fmt;

use tracing::warn;

use clinicdb_core::catalog::ServiceCatalog;
use clinicdb_core::types::{
    FilterSpec, NumericRange, PriceFacet, ProviderRecord, SearchField, SearchMode, TextSearch,
};

/// One active predicate, as shown to the user next to the results.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedFilter {
    Price(PriceFacet, NumericRange),
    Rating(NumericRange),
    Cities(Vec<String>),
    Search(TextSearch),
}

fn amount(v: f64) -> String {
    if v.fract() == 0.0 { format!("{v:.0}") } else { format!("{v:.2}") }
}

fn describe_range(range: &NumericRange, unit: &str) -> String {
    if range.is_inverted() {
        return "empty range (matches nothing)".to_string();
    }
    match (range.min, range.max) {
        (Some(lo), Some(hi)) => format!("{unit}{} to {unit}{}", amount(lo), amount(hi)),
        (None, Some(hi)) => format!("up to {unit}{}", amount(hi)),
        (Some(lo), None) => format!("at least {unit}{}", amount(lo)),
        (None, None) => "listed".to_string(),
    }
}

impl fmt::Display for AppliedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Price(facet, range) => write!(f, "{facet} price: {}", describe_range(range, "$")),
            Self::Rating(range) => write!(f, "rating: {}", describe_range(range, "")),
            Self::Cities(cities) => write!(f, "city: {}", cities.join(", ")),
            Self::Search(TextSearch { term, mode: SearchMode::Fuzzy }) => write!(f, "search: \"{term}\""),
            Self::Search(TextSearch { term, mode: SearchMode::Exact(field) }) => write!(f, "{field} is \"{term}\""),
        }
    }
}

/// Active predicates of `spec` in display order.
pub fn explain(spec: &FilterSpec) -> Vec<AppliedFilter> {
    let mut applied: Vec<AppliedFilter> = spec.prices().map(|(f, r)| AppliedFilter::Price(f, r)).collect();
    if let Some(r) = spec.rating() {
        applied.push(AppliedFilter::Rating(r));
    }
    if !spec.cities().is_empty() {
        applied.push(AppliedFilter::Cities(spec.cities().to_vec()));
    }
    if let Some(search) = spec.search() {
        applied.push(AppliedFilter::Search(search.clone()));
    }
    applied
}

#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub records: Vec<&'a ProviderRecord>,
    pub applied: Vec<AppliedFilter>,
}

impl FilterOutcome<'_> {
    /// "exam price: up to $80; city: Vancouver", or "no filters".
    pub fn explanation(&self) -> String {
        if self.applied.is_empty() {
            return "no filters".to_string();
        }
        self.applied.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    }
}

pub struct FilterEngine<'c> {
    catalog: &'c ServiceCatalog,
}

impl<'c> FilterEngine<'c> {
    pub fn new(catalog: &'c ServiceCatalog) -> Self {
        Self { catalog }
    }

    /// Keeps the records matching every active predicate, in input order.
    pub fn apply<'a, I>(&self, records: I, spec: &FilterSpec) -> FilterOutcome<'a>
    where
        I: IntoIterator<Item = &'a ProviderRecord>,
    {
        let inverted = spec.prices().any(|(_, r)| r.is_inverted()) || spec.rating().is_some_and(|r| r.is_inverted());
        if inverted {
            warn!("filter spec contains an inverted range; it will match no records");
        }
        let search = spec.search().map(|s| (s.term.trim().to_lowercase(), s.mode));
        let records = records
            .into_iter()
            .filter(|r| self.matches_facets(r, spec))
            .filter(|r| search.as_ref().map_or(true, |(term, mode)| self.matches_text(r, term, *mode)))
            .collect();
        FilterOutcome { records, applied: explain(spec) }
    }

    pub fn matches(&self, record: &ProviderRecord, spec: &FilterSpec) -> bool {
        self.matches_facets(record, spec)
            && spec
                .search()
                .map_or(true, |s| self.matches_text(record, &s.term.trim().to_lowercase(), s.mode))
    }

    fn matches_facets(&self, record: &ProviderRecord, spec: &FilterSpec) -> bool {
        spec.prices().all(|(facet, range)| range.contains(record.price(facet)))
            && spec.rating().map_or(true, |range| range.contains(record.rating()))
            && (spec.cities().is_empty()
                || spec.cities().iter().any(|c| c.trim().to_lowercase() == record.city.trim().to_lowercase()))
    }

    /// `term` is already trimmed and lowercased.
    fn matches_text(&self, record: &ProviderRecord, term: &str, mode: SearchMode) -> bool {
        if term.is_empty() {
            return true;
        }
        match mode {
            SearchMode::Fuzzy => {
                let contains = |field: &str| field.to_lowercase().contains(term);
                contains(record.name.as_str())
                    || contains(record.city.as_str())
                    || contains(record.address.as_str())
                    || contains(record.province.as_str())
                    || self.service_names(record).any(contains)
                    || self.in_category(record, term)
            }
            SearchMode::Exact(field) => {
                let equals = |value: &str| value.trim().to_lowercase() == term;
                match field {
                    SearchField::ClinicName => equals(record.name.as_str()),
                    SearchField::City => equals(record.city.as_str()),
                    SearchField::Address => equals(record.address.as_str()),
                    SearchField::Province => equals(record.province.as_str()),
                    SearchField::Service => self.service_names(record).any(equals),
                    SearchField::Category => self.in_category(record, term),
                }
            }
        }
    }

    fn service_names<'r>(&'r self, record: &'r ProviderRecord) -> impl Iterator<Item = &'r str> + 'r {
        record.services.iter().filter_map(|code| self.catalog.display_name(code))
    }

    /// Category membership through the explicit parent reference only.
    fn in_category(&self, record: &ProviderRecord, term: &str) -> bool {
        self.catalog
            .resolve_category(term)
            .is_some_and(|category| record.services.iter().any(|code| self.catalog.belongs_to(code, &category.code)))
    }
}
