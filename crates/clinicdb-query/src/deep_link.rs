//! Shareable search links: `q=<query>&type=<kind>[&filters=<json>]`.
//!
//! `filters` is only written for `type=nlp` and holds a JSON object with the
//! keys `exam`, `vaccine`, `spay`, `neuter`, `rating` (each absent or a
//! `{min, max}` object) and `city` (ordered list). Decoding never fails: a
//! malformed parameter is logged and treated as absent.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use clinicdb_core::types::{FilterSpec, NumericRange, PriceFacet, SearchField, SearchMode, TextSearch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkKind {
    #[default]
    Text,
    Field(SearchField),
    Nlp,
}

impl LinkKind {
    /// Unknown tags decode as plain text search.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Self::Text,
            "nlp" => Self::Nlp,
            other => SearchField::ALL
                .into_iter()
                .find(|f| f.as_str() == other)
                .map_or_else(
                    || {
                        warn!(tag = other, "unknown deep-link type, using text search");
                        Self::Text
                    },
                    Self::Field,
                ),
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Field(field) => f.write_str(field.as_str()),
            Self::Nlp => f.write_str("nlp"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam: Option<NumericRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccine: Option<NumericRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spay: Option<NumericRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neuter: Option<NumericRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<NumericRange>,
    #[serde(default)]
    pub city: Vec<String>,
}

impl LinkFilters {
    pub fn from_spec(spec: &FilterSpec) -> Self {
        Self {
            exam: spec.price(PriceFacet::Exam),
            vaccine: spec.price(PriceFacet::Vaccine),
            spay: spec.price(PriceFacet::Spay),
            neuter: spec.price(PriceFacet::Neuter),
            rating: spec.rating(),
            city: spec.cities().to_vec(),
        }
    }

    fn price(&self, facet: PriceFacet) -> Option<NumericRange> {
        match facet {
            PriceFacet::Exam => self.exam,
            PriceFacet::Vaccine => self.vaccine,
            PriceFacet::Spay => self.spay,
            PriceFacet::Neuter => self.neuter,
        }
    }

    /// Facet-only spec; the search text is not part of the filters record.
    pub fn to_spec(&self) -> FilterSpec {
        PriceFacet::ALL
            .into_iter()
            .fold(FilterSpec::new(), |spec, facet| spec.with_price(facet, self.price(facet)))
            .with_rating(self.rating)
            .with_cities(self.city.iter().cloned())
    }

    /// Parses the JSON record; any error is logged and yields `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(raw) {
            Ok(filters) => Some(filters),
            Err(e) => {
                warn!(error = %e, "ignoring malformed deep-link filters");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeepLink {
    pub query: String,
    pub kind: LinkKind,
    pub filters: Option<LinkFilters>,
}

impl DeepLink {
    /// Link for the current state. Active facets make it an `nlp` link
    /// carrying `raw_query`; otherwise the search text and mode decide the kind.
    ///
    /// An `nlp` link has no slot for a text search, so an exact or fuzzy
    /// search set alongside active facets is not carried: opening the link
    /// restores the facets and the raw query text with no search applied.
    pub fn from_spec(raw_query: &str, spec: &FilterSpec) -> Self {
        if spec.active_facet_count() > 0 {
            return Self {
                query: raw_query.to_string(),
                kind: LinkKind::Nlp,
                filters: Some(LinkFilters::from_spec(spec)),
            };
        }
        match spec.search() {
            Some(TextSearch { term, mode: SearchMode::Exact(field) }) => {
                Self { query: term.clone(), kind: LinkKind::Field(*field), filters: None }
            }
            Some(TextSearch { term, mode: SearchMode::Fuzzy }) => {
                Self { query: term.clone(), kind: LinkKind::Text, filters: None }
            }
            None => Self { query: raw_query.to_string(), kind: LinkKind::Text, filters: None },
        }
    }

    pub fn encode(&self) -> String {
        let mut out = format!("q={}&type={}", urlencoding::encode(&self.query), self.kind);
        if let (LinkKind::Nlp, Some(filters)) = (self.kind, &self.filters) {
            match serde_json::to_string(filters) {
                Ok(json) => {
                    out.push_str("&filters=");
                    out.push_str(&urlencoding::encode(&json));
                }
                Err(e) => warn!(error = %e, "could not serialize deep-link filters"),
            }
        }
        out
    }

    /// Decodes a query string (with or without a leading `?`).
    pub fn decode(query_string: &str) -> Self {
        let mut link = Self::default();
        let mut raw_filters = None;
        for pair in query_string.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = value.replace('+', " ");
            let value = match urlencoding::decode(&value) {
                Ok(v) => v.into_owned(),
                Err(e) => {
                    warn!(key, error = %e, "ignoring undecodable deep-link parameter");
                    continue;
                }
            };
            match key {
                "q" => link.query = value,
                "type" => link.kind = LinkKind::from_tag(&value),
                "filters" => raw_filters = Some(value),
                _ => {}
            }
        }
        if link.kind == LinkKind::Nlp {
            link.filters = raw_filters.as_deref().and_then(LinkFilters::decode);
        }
        link
    }

    /// Spec this link restores. An `nlp` link without usable filters is unfiltered.
    pub fn to_spec(&self) -> FilterSpec {
        match self.kind {
            LinkKind::Text => FilterSpec::new().with_search(Some(TextSearch::fuzzy(self.query.clone()))),
            LinkKind::Field(field) => {
                FilterSpec::new().with_search(Some(TextSearch::exact(self.query.clone(), field)))
            }
            LinkKind::Nlp => self.filters.as_ref().map(LinkFilters::to_spec).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_text() {
        assert_eq!(LinkKind::from_tag("bogus"), LinkKind::Text);
        assert_eq!(LinkKind::from_tag("clinic-name"), LinkKind::Field(SearchField::ClinicName));
    }

    #[test]
    fn plus_decodes_as_space() {
        let link = DeepLink::decode("?q=kits+animal&type=text");
        assert_eq!(link.query, "kits animal");
    }
}
