//! Ordering of filtered results. Every key sorts stably, so records that
//! compare equal keep the order they arrived in.

use std::cmp::Ordering;

use clinicdb_core::types::{PriceFacet, ProviderRecord, SortKey};

fn by_name(a: &ProviderRecord, b: &ProviderRecord) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

fn by_city(a: &ProviderRecord, b: &ProviderRecord) -> Ordering {
    a.city.to_lowercase().cmp(&b.city.to_lowercase())
}

/// Missing prices sort after every present one.
fn by_price(facet: PriceFacet, a: &ProviderRecord, b: &ProviderRecord) -> Ordering {
    let key = |r: &ProviderRecord| r.price(facet).unwrap_or(f64::INFINITY);
    key(a).total_cmp(&key(b))
}

pub fn compare(key: SortKey, a: &ProviderRecord, b: &ProviderRecord) -> Ordering {
    match key {
        // Better-documented clinics first, then alphabetical.
        SortKey::NameAsc => b.completeness().cmp(&a.completeness()).then_with(|| by_name(a, b)),
        SortKey::NameDesc => b.completeness().cmp(&a.completeness()).then_with(|| by_name(b, a)),
        SortKey::CityAsc => by_city(a, b),
        SortKey::CityDesc => by_city(b, a),
        SortKey::LowestPrice(facet) => by_price(facet, a, b),
        SortKey::HighestRating => {
            let rating = |r: &ProviderRecord| r.rating().unwrap_or(0.0);
            rating(b).total_cmp(&rating(a))
        }
    }
}

/// Sorted copy of `records`; the input slice is left untouched.
pub fn sort_records<'a>(records: &[&'a ProviderRecord], key: SortKey) -> Vec<&'a ProviderRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| compare(key, a, b));
    sorted
}
