use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use clinicdb_core::types::{FilterSpec, NumericRange, PriceFacet, TextSearch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// How a price bound was expressed in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceComparison {
    Between,
    Under,
    Over,
    /// Budget descriptor ("cheap") without a number.
    Heuristic,
}

/// Structured reading of one free-text query.
///
/// A facet present in `services` with a `None` range was mentioned without a
/// price ("vaccine clinics").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub original: String,
    pub services: BTreeMap<PriceFacet, Option<NumericRange>>,
    pub comparisons: BTreeMap<PriceFacet, PriceComparison>,
    pub rating: Option<NumericRange>,
    pub locations: Vec<String>,
    pub remainder: String,
    pub confidence: Confidence,
    pub suggestions: Vec<String>,
    pub interpretation: String,
}

impl ParsedQuery {
    /// Nothing recognized: the whole text becomes the free-text remainder.
    pub fn fallback(text: &str) -> Self {
        Self {
            original: text.to_string(),
            services: BTreeMap::new(),
            comparisons: BTreeMap::new(),
            rating: None,
            locations: Vec::new(),
            remainder: text.trim().to_string(),
            confidence: Confidence::Low,
            suggestions: Vec::new(),
            interpretation: SHOWING_ALL.to_string(),
        }
    }

    pub fn has_filters(&self) -> bool {
        !self.services.is_empty() || self.rating.is_some() || !self.locations.is_empty()
    }

    /// Range the parser assigns to `facet`; a mention without a price is unbounded.
    pub fn service_range(&self, facet: PriceFacet) -> Option<NumericRange> {
        self.services.get(&facet).map(|r| r.unwrap_or_else(NumericRange::unbounded))
    }

    /// Standalone filter spec for this query. The low-confidence fallback
    /// becomes a fuzzy text search over the remainder.
    pub fn to_filter_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::new();
        for facet in self.services.keys() {
            spec = spec.with_price(*facet, self.service_range(*facet));
        }
        spec = spec.with_rating(self.rating).with_cities(self.locations.iter().cloned());
        if self.confidence == Confidence::Low {
            spec = spec.with_search(Some(TextSearch::fuzzy(self.remainder.clone())));
        }
        spec
    }
}

pub(crate) const SHOWING_ALL: &str = "showing all results";

/// "80", "79.99".
pub(crate) fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn format_rating(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn price_phrase(facet: PriceFacet, range: Option<NumericRange>) -> String {
    let Some(range) = range else { return facet.to_string() };
    match (range.min, range.max) {
        (Some(lo), Some(hi)) => format!("{facet} between ${} and ${}", format_amount(lo), format_amount(hi)),
        (None, Some(hi)) => format!("{facet} under ${}", format_amount(hi)),
        (Some(lo), None) => format!("{facet} over ${}", format_amount(lo)),
        (None, None) => facet.to_string(),
    }
}

fn rating_phrase(range: NumericRange) -> String {
    match (range.min, range.max) {
        (Some(lo), Some(hi)) if hi < 5.0 => {
            format!("{}-{} star rating", format_rating(lo), format_rating(hi))
        }
        (Some(lo), _) => format!("{}+ star rating", format_rating(lo)),
        (None, Some(hi)) => format!("up to {} star rating", format_rating(hi)),
        (None, None) => "any rating".to_string(),
    }
}

fn location_phrase(locations: &[String]) -> String {
    match locations {
        [] => String::new(),
        [only] => format!("in {only}"),
        [init @ .., last] => format!("in {} or {last}", init.join(", ")),
    }
}

/// Joins one phrase per populated filter in the order services, rating, location.
pub(crate) fn interpretation(
    services: &BTreeMap<PriceFacet, Option<NumericRange>>,
    rating: Option<NumericRange>,
    locations: &[String],
) -> String {
    let mut phrases: Vec<String> = services.iter().map(|(f, r)| price_phrase(*f, *r)).collect();
    if let Some(r) = rating {
        phrases.push(rating_phrase(r));
    }
    if !locations.is_empty() {
        phrases.push(location_phrase(locations));
    }
    if phrases.is_empty() {
        SHOWING_ALL.to_string()
    } else {
        phrases.join(", ")
    }
}
