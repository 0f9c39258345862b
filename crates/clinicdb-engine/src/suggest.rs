//! Autocomplete suggestions for the search box.
//!
//! Values come from clinic names, cities, provinces, addresses, service
//! display names and category names, in that order. Picking one switches the
//! search to exact mode on the suggestion's field.

use std::collections::BTreeSet;

use serde::Serialize;

use clinicdb_core::catalog::ServiceCatalog;
use clinicdb_core::types::{ProviderRecord, SearchField};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub field: SearchField,
    pub value: String,
}

pub fn suggest(records: &[ProviderRecord], catalog: &ServiceCatalog, term: &str, limit: usize) -> Vec<Suggestion> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut push = |field: SearchField, values: Vec<&str>| {
        let mut seen = BTreeSet::new();
        for value in values.into_iter().map(str::trim) {
            if value.to_lowercase().contains(&needle) && seen.insert(value.to_lowercase()) {
                out.push(Suggestion { field, value: value.to_string() });
            }
        }
    };

    push(SearchField::ClinicName, records.iter().map(|r| r.name.as_str()).collect());
    push(SearchField::City, records.iter().map(|r| r.city.as_str()).collect());
    push(SearchField::Province, records.iter().map(|r| r.province.as_str()).collect());
    push(SearchField::Address, records.iter().map(|r| r.address.as_str()).collect());
    push(
        SearchField::Service,
        catalog.definitions().iter().filter(|d| !d.is_category()).map(|d| d.name.as_str()).collect(),
    );
    push(SearchField::Category, catalog.categories().map(|d| d.name.as_str()).collect());

    out.truncate(limit);
    out
}
