//! Domain types used by the parser, the engines and the session layer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type ProviderId = String;

/// One of the fixed, named price fields every clinic may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceFacet {
    Exam,
    Vaccine,
    Spay,
    Neuter,
}

impl PriceFacet {
    pub const ALL: [PriceFacet; 4] = [Self::Exam, Self::Vaccine, Self::Spay, Self::Neuter];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exam => "exam",
            Self::Vaccine => "vaccine",
            Self::Spay => "spay",
            Self::Neuter => "neuter",
        }
    }
}

impl fmt::Display for PriceFacet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceFacet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::NotFound(format!("price facet '{s}'")))
    }
}

/// Published prices; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccine: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neuter: Option<f64>,
}

impl Prices {
    pub fn get(&self, facet: PriceFacet) -> Option<f64> {
        match facet {
            PriceFacet::Exam => self.exam,
            PriceFacet::Vaccine => self.vaccine,
            PriceFacet::Spay => self.spay,
            PriceFacet::Neuter => self.neuter,
        }
    }

    pub fn set(&mut self, facet: PriceFacet, value: Option<f64>) {
        let slot = match facet {
            PriceFacet::Exam => &mut self.exam,
            PriceFacet::Vaccine => &mut self.vaccine,
            PriceFacet::Spay => &mut self.spay,
            PriceFacet::Neuter => &mut self.neuter,
        };
        *slot = value;
    }
}

/// A clinic as supplied by the data loader.
///
/// - `services`: service codes the clinic offers (see [`ServiceDefinition`])
/// - `prices`: optional published prices per [`PriceFacet`]
/// - `rating`: aggregate rating in `[0, 5]`, absent for unreviewed clinics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: ProviderId,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub services: BTreeSet<String>,
    #[serde(default)]
    pub prices: Prices,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    review_count: Option<u32>,
}

impl ProviderRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            city: city.into(),
            province: String::new(),
            address: String::new(),
            website: None,
            services: BTreeSet::new(),
            prices: Prices::default(),
            rating: None,
            review_count: None,
        }
    }

    #[must_use]
    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = province.into();
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_service(mut self, code: impl Into<String>) -> Self {
        self.services.insert(code.into());
        self
    }

    #[must_use]
    pub fn with_price(mut self, facet: PriceFacet, value: f64) -> Self {
        self.prices.set(facet, Some(value));
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: f64, reviews: u32) -> Self {
        self.rating = Some(rating);
        self.review_count = Some(reviews);
        self
    }

    /// Price for `facet`, or `None` when absent or not a finite number.
    pub fn price(&self, facet: PriceFacet) -> Option<f64> {
        self.prices.get(facet).filter(|v| v.is_finite())
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating.filter(|v| v.is_finite())
    }

    /// Review count; a rated clinic with no recorded count reports zero.
    pub fn review_count(&self) -> Option<u32> {
        self.review_count.or_else(|| self.rating.map(|_| 0))
    }

    /// Number of price facets with a present, finite value.
    pub fn completeness(&self) -> usize {
        PriceFacet::ALL
            .into_iter()
            .filter(|f| self.price(*f).is_some())
            .count()
    }
}

/// A service offered by clinics. `parent == None` marks a top-level category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub position: u32,
}

impl ServiceDefinition {
    pub fn new(code: impl Into<String>, name: impl Into<String>, parent: Option<&str>, position: u32) -> Self {
        Self { code: code.into(), name: name.into(), parent: parent.map(str::to_string), position }
    }

    pub fn is_category(&self) -> bool {
        self.parent.is_none()
    }
}

/// Inclusive numeric bounds; a missing bound is open.
///
/// Constructors other than [`NumericRange::new`] keep `min <= max`. A range
/// built with `new` may be inverted, in which case [`NumericRange::contains`]
/// rejects every value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Two explicit bounds in either order.
    pub fn between(a: f64, b: f64) -> Self {
        Self { min: Some(a.min(b)), max: Some(a.max(b)) }
    }

    pub fn at_most(max: f64) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    /// Matches any present value.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(lo), Some(hi)) if lo > hi)
    }

    /// Missing and non-finite values never match.
    pub fn contains(&self, value: Option<f64>) -> bool {
        let Some(v) = value.filter(|v| v.is_finite()) else { return false };
        if self.is_inverted() {
            return false;
        }
        self.min.map_or(true, |lo| v >= lo) && self.max.map_or(true, |hi| v <= hi)
    }
}

/// Record field an exact search is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchField {
    ClinicName,
    City,
    Service,
    Category,
    Address,
    Province,
}

impl SearchField {
    pub const ALL: [SearchField; 6] = [
        Self::ClinicName,
        Self::City,
        Self::Service,
        Self::Category,
        Self::Address,
        Self::Province,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClinicName => "clinic-name",
            Self::City => "city",
            Self::Service => "service",
            Self::Category => "category",
            Self::Address => "address",
            Self::Province => "province",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Case-insensitive substring across all searchable fields.
    #[default]
    Fuzzy,
    /// Case-insensitive equality against one field, used after a suggestion is picked.
    Exact(SearchField),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSearch {
    pub term: String,
    pub mode: SearchMode,
}

impl TextSearch {
    pub fn fuzzy(term: impl Into<String>) -> Self {
        Self { term: term.into(), mode: SearchMode::Fuzzy }
    }

    pub fn exact(term: impl Into<String>, field: SearchField) -> Self {
        Self { term: term.into(), mode: SearchMode::Exact(field) }
    }
}

/// Canonical description of every active facet and the search text.
///
/// Values are immutable: the `with_*` methods return an updated copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    prices: BTreeMap<PriceFacet, NumericRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<NumericRange>,
    #[serde(default)]
    cities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    search: Option<TextSearch>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price(&self, facet: PriceFacet) -> Option<NumericRange> {
        self.prices.get(&facet).copied()
    }

    pub fn prices(&self) -> impl Iterator<Item = (PriceFacet, NumericRange)> + '_ {
        self.prices.iter().map(|(f, r)| (*f, *r))
    }

    pub fn rating(&self) -> Option<NumericRange> {
        self.rating
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn search(&self) -> Option<&TextSearch> {
        self.search.as_ref()
    }

    #[must_use]
    pub fn with_price(mut self, facet: PriceFacet, range: Option<NumericRange>) -> Self {
        match range {
            Some(r) => {
                self.prices.insert(facet, r);
            }
            None => {
                self.prices.remove(&facet);
            }
        }
        self
    }

    #[must_use]
    pub fn with_rating(mut self, range: Option<NumericRange>) -> Self {
        self.rating = range;
        self
    }

    /// Replaces the city set, dropping blanks and case-insensitive duplicates
    /// while keeping first-seen order.
    #[must_use]
    pub fn with_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        self.cities = cities
            .into_iter()
            .map(Into::into)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && seen.insert(c.to_lowercase()))
            .collect();
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<TextSearch>) -> Self {
        self.search = search.filter(|s| !s.term.trim().is_empty());
        self
    }

    /// Facet filters (prices, rating, cities) that are active, ignoring search text.
    pub fn active_facet_count(&self) -> usize {
        self.prices.len() + usize::from(self.rating.is_some()) + usize::from(!self.cities.is_empty())
    }

    pub fn is_unrestricted(&self) -> bool {
        self.active_facet_count() == 0 && self.search.is_none()
    }
}

/// Result ordering selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    CityAsc,
    CityDesc,
    LowestPrice(PriceFacet),
    HighestRating,
}

impl SortKey {
    pub fn all() -> Vec<SortKey> {
        let mut keys = vec![Self::NameAsc, Self::NameDesc, Self::CityAsc, Self::CityDesc];
        keys.extend(PriceFacet::ALL.into_iter().map(Self::LowestPrice));
        keys.push(Self::HighestRating);
        keys
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameAsc => f.write_str("name-asc"),
            Self::NameDesc => f.write_str("name-desc"),
            Self::CityAsc => f.write_str("city-asc"),
            Self::CityDesc => f.write_str("city-desc"),
            Self::LowestPrice(facet) => write!(f, "price-{facet}"),
            Self::HighestRating => f.write_str("rating"),
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "name-asc" | "name" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "city-asc" | "city" => Ok(Self::CityAsc),
            "city-desc" => Ok(Self::CityDesc),
            "rating" | "rating-desc" => Ok(Self::HighestRating),
            other => match other.strip_prefix("price-") {
                Some(facet) => facet.parse().map(Self::LowestPrice),
                None => Err(Error::NotFound(format!("sort key '{other}'"))),
            },
        }
    }
}

impl TryFrom<String> for SortKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}
