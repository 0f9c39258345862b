//! Pattern-based parser turning free text into a [`ParsedQuery`].
//!
//! Matching runs over the normalized working text. Every recognized span is
//! claimed so later stages cannot reuse it: star ratings are claimed before
//! prices are scanned (so "4 star" is never a $4 threshold), and gazetteer
//! names are tried longest first (so "North Vancouver" never also yields
//! "Vancouver").

use std::collections::BTreeMap;
use std::ops::Range;

use regex::Match;
use tracing::debug;

use clinicdb_core::types::{NumericRange, PriceFacet};

use crate::lexicon::{
    default_cheap_threshold, Bound, BETWEEN_RANGE, CHEAP_DESCRIPTOR, COMPARISON_KEYWORDS, CONTEXT_WINDOW,
    DOLLAR_RANGE, FACET_PATTERNS, FILLER_WORDS, FROM_RANGE, LOCATION_PATTERNS, QUALITY_DESCRIPTOR,
    RATED_AT_LEAST, RATING_KEYWORD, RATING_RANGE, RATING_STARS, SINGLE_AMOUNT,
};
use crate::numbers;
use crate::parsed::{format_amount, interpretation, Confidence, ParsedQuery, PriceComparison};

#[derive(Debug, Default)]
struct Claims(Vec<Range<usize>>);

impl Claims {
    fn overlaps(&self, r: &Range<usize>) -> bool {
        self.0.iter().any(|c| c.start < r.end && r.start < c.end)
    }

    fn claim(&mut self, r: Range<usize>) {
        if !r.is_empty() {
            self.0.push(r);
        }
    }

    fn contains(&self, pos: usize) -> bool {
        self.0.iter().any(|c| c.contains(&pos))
    }
}

#[derive(Debug, Clone, Copy)]
struct PriceMatch {
    range: NumericRange,
    comparison: PriceComparison,
    start: usize,
}

#[derive(Debug, Clone)]
pub struct QueryParser {
    cheap_thresholds: BTreeMap<PriceFacet, f64>,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    pub fn new() -> Self {
        let cheap_thresholds = PriceFacet::ALL
            .into_iter()
            .map(|f| (f, default_cheap_threshold(f)))
            .collect();
        Self { cheap_thresholds }
    }

    /// Built-in thresholds with `overrides` applied; invalid values are ignored.
    pub fn with_cheap_thresholds(overrides: &BTreeMap<PriceFacet, f64>) -> Self {
        let mut parser = Self::new();
        for (facet, value) in overrides {
            if value.is_finite() && *value >= 0.0 {
                parser.cheap_thresholds.insert(*facet, *value);
            }
        }
        parser
    }

    pub fn cheap_threshold(&self, facet: PriceFacet) -> f64 {
        self.cheap_thresholds
            .get(&facet)
            .copied()
            .unwrap_or_else(|| default_cheap_threshold(facet))
    }

    /// Parses `text`. Never fails: unrecognized input yields a low-confidence
    /// fallback whose remainder is the original text.
    pub fn parse(&self, text: &str) -> ParsedQuery {
        let working = numbers::normalize(text);
        let mut claims = Claims::default();
        let mut suggestions = Vec::new();
        let mut confidence = Confidence::High;

        let mut mentions: Vec<(PriceFacet, usize)> = Vec::new();
        for (facet, re) in FACET_PATTERNS.iter() {
            for m in re.find_iter(&working) {
                mentions.push((*facet, m.start()));
                claims.claim(m.range());
            }
        }
        mentions.sort_by_key(|(_, start)| *start);
        let mut services: BTreeMap<PriceFacet, Option<NumericRange>> =
            mentions.iter().map(|(f, _)| (*f, None)).collect();
        let mut comparisons = BTreeMap::new();

        let explicit_rating = extract_rating(&working, &mut claims);

        let prices = extract_prices(&working, &mut claims);
        if let Some(last) = prices.last() {
            if mentions.is_empty() {
                for p in &prices {
                    attach_price(&mut services, &mut comparisons, PriceFacet::Exam, p);
                }
                confidence = Confidence::Medium;
                suggestions.push(
                    "Price applied to exam fees; mention a service (vaccine, spay, neuter) to filter a different price."
                        .to_string(),
                );
            } else if prices.len() == 1 {
                for range in services.values_mut() {
                    *range = Some(last.range);
                }
                for facet in services.keys() {
                    comparisons.insert(*facet, last.comparison);
                }
            } else {
                for p in &prices {
                    if let Some(facet) = nearest_mention(&mentions, p.start) {
                        attach_price(&mut services, &mut comparisons, facet, p);
                    }
                }
            }
        }

        if let Some(m) = CHEAP_DESCRIPTOR.find(&working) {
            claims.claim(m.range());
            if prices.is_empty() {
                if services.is_empty() {
                    suggestions.push(
                        "Mention a service (exam, vaccine, spay or neuter) to apply a budget price filter.".to_string(),
                    );
                } else {
                    for (facet, range) in &mut services {
                        let limit = self.cheap_threshold(*facet);
                        *range = Some(NumericRange::at_most(limit));
                        comparisons.insert(*facet, PriceComparison::Heuristic);
                        suggestions.push(format!(
                            "Assumed a budget {facet} price of up to ${}; adjust the price filter to refine.",
                            format_amount(limit)
                        ));
                    }
                    confidence = Confidence::Medium;
                }
            }
        }

        let rating = explicit_rating.or_else(|| {
            let quality = QUALITY_DESCRIPTOR.find(&working)?;
            let keyword = RATING_KEYWORD.find(&working)?;
            claims.claim(quality.range());
            claims.claim(keyword.range());
            Some(NumericRange::between(4.0, 5.0))
        });

        let locations = extract_locations(&working, &mut claims);

        if services.is_empty() && rating.is_none() && locations.is_empty() {
            let mut parsed = ParsedQuery::fallback(text);
            suggestions.push(
                "Try a service, a price, a star rating or a city, e.g. \"exam under $80 in Vancouver\".".to_string(),
            );
            parsed.suggestions = suggestions;
            debug!(query = text, "no filter patterns recognized, falling back to text search");
            return parsed;
        }

        let interpretation = interpretation(&services, rating, &locations);
        debug!(query = text, %confidence, interpretation = %interpretation, "parsed query");
        ParsedQuery {
            original: text.to_string(),
            services,
            comparisons,
            rating,
            locations,
            remainder: remainder(&working, &claims),
            confidence,
            suggestions,
            interpretation,
        }
    }
}

/// A lower and an upper bound on the same facet combine into one range;
/// otherwise the later price replaces the earlier one.
fn attach_price(
    services: &mut BTreeMap<PriceFacet, Option<NumericRange>>,
    comparisons: &mut BTreeMap<PriceFacet, PriceComparison>,
    facet: PriceFacet,
    price: &PriceMatch,
) {
    let previous = services.get(&facet).copied().flatten().zip(comparisons.get(&facet).copied());
    let (range, comparison) = match previous {
        Some((earlier, PriceComparison::Over | PriceComparison::Under)) if earlier_pairs_with(earlier, price) => {
            let lo = earlier.min.or(price.range.min);
            let hi = earlier.max.or(price.range.max);
            match (lo, hi) {
                (Some(lo), Some(hi)) => (NumericRange::between(lo, hi), PriceComparison::Between),
                _ => (price.range, price.comparison),
            }
        }
        _ => (price.range, price.comparison),
    };
    services.insert(facet, Some(range));
    comparisons.insert(facet, comparison);
}

fn earlier_pairs_with(earlier: NumericRange, price: &PriceMatch) -> bool {
    match price.comparison {
        PriceComparison::Under => earlier.max.is_none(),
        PriceComparison::Over => earlier.min.is_none(),
        PriceComparison::Between | PriceComparison::Heuristic => false,
    }
}

fn parse_amount(m: Option<Match<'_>>) -> Option<f64> {
    m?.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn clamp_rating(v: f64) -> f64 {
    v.clamp(0.0, 5.0)
}

/// Claims every star-rating phrase and returns the first one found.
fn extract_rating(working: &str, claims: &mut Claims) -> Option<NumericRange> {
    let mut found = None;
    for caps in RATING_RANGE.captures_iter(working) {
        let Some(whole) = caps.get(0) else { continue };
        let low = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3));
        let (Some(a), Some(b)) = (parse_amount(low), parse_amount(caps.get(4))) else { continue };
        claims.claim(whole.range());
        found = found.or(Some(NumericRange::between(clamp_rating(a), clamp_rating(b))));
    }
    for re in [&*RATING_STARS, &*RATED_AT_LEAST] {
        for caps in re.captures_iter(working) {
            let Some(whole) = caps.get(0) else { continue };
            if claims.overlaps(&whole.range()) {
                continue;
            }
            let Some(n) = parse_amount(caps.get(1)) else { continue };
            claims.claim(whole.range());
            found = found.or(Some(NumericRange::new(Some(clamp_rating(n)), Some(5.0))));
        }
    }
    found
}

/// Explicit two-number ranges win; single thresholds are only read when no
/// range was found.
fn extract_prices(working: &str, claims: &mut Claims) -> Vec<PriceMatch> {
    let mut found = Vec::new();
    for re in [&*BETWEEN_RANGE, &*FROM_RANGE, &*DOLLAR_RANGE] {
        for caps in re.captures_iter(working) {
            let Some(whole) = caps.get(0) else { continue };
            if claims.overlaps(&whole.range()) {
                continue;
            }
            let (Some(a), Some(b)) = (parse_amount(caps.get(1)), parse_amount(caps.get(2))) else { continue };
            claims.claim(whole.range());
            found.push(PriceMatch {
                range: NumericRange::between(a, b),
                comparison: PriceComparison::Between,
                start: whole.start(),
            });
        }
    }
    if !found.is_empty() {
        found.sort_by_key(|p| p.start);
        return found;
    }

    for caps in SINGLE_AMOUNT.captures_iter(working) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(2)) else { continue };
        if claims.overlaps(&number.range()) || preceded_by_alnum(working, whole.start()) {
            continue;
        }
        let has_currency = caps.get(1).is_some() || caps.get(3).is_some();
        let keyword = comparison_before(working, whole.start());
        if !has_currency && keyword.is_none() {
            continue;
        }
        let Some(value) = parse_amount(Some(number)) else { continue };
        let (range, comparison) = match keyword.as_ref().map(|(bound, _)| *bound) {
            Some(Bound::Lower) => (NumericRange::at_least(value), PriceComparison::Over),
            _ => (NumericRange::at_most(value), PriceComparison::Under),
        };
        claims.claim(whole.range());
        if let Some((_, span)) = keyword {
            claims.claim(span);
        }
        found.push(PriceMatch { range, comparison, start: whole.start() });
    }
    found
}

fn preceded_by_alnum(working: &str, pos: usize) -> bool {
    pos > 0 && working.as_bytes()[pos - 1].is_ascii_alphanumeric()
}

fn is_word_at(working: &str, start: usize, end: usize) -> bool {
    let bytes = working.as_bytes();
    !preceded_by_alnum(working, start) && (end >= bytes.len() || !bytes[end].is_ascii_alphanumeric())
}

/// Closest comparison keyword in the window before `start`, ignoring keywords
/// separated from the amount by another number.
fn comparison_before(working: &str, start: usize) -> Option<(Bound, Range<usize>)> {
    let from = start.saturating_sub(CONTEXT_WINDOW);
    let window = &working[from..start];
    let mut best: Option<(Bound, Range<usize>)> = None;
    for (keyword, bound) in COMPARISON_KEYWORDS {
        let Some(pos) = window.rfind(keyword) else { continue };
        let span = from + pos..from + pos + keyword.len();
        if !is_word_at(working, span.start, span.end) {
            continue;
        }
        if working[span.end..start].bytes().any(|b| b.is_ascii_digit()) {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, current)) => span.end > current.end || (span.end == current.end && span.len() > current.len()),
        };
        if better {
            best = Some((*bound, span));
        }
    }
    best
}

/// The facet mentioned most recently before `pos`, else the first one after it.
fn nearest_mention(mentions: &[(PriceFacet, usize)], pos: usize) -> Option<PriceFacet> {
    mentions
        .iter()
        .rev()
        .find(|(_, start)| *start < pos)
        .or_else(|| mentions.iter().find(|(_, start)| *start > pos))
        .map(|(facet, _)| *facet)
}

/// Gazetteer names in order of appearance, longest names claimed first.
fn extract_locations(working: &str, claims: &mut Claims) -> Vec<String> {
    let mut hits: Vec<(usize, &'static str)> = Vec::new();
    for (name, re) in LOCATION_PATTERNS.iter() {
        for m in re.find_iter(working) {
            if claims.overlaps(&m.range()) {
                continue;
            }
            claims.claim(m.range());
            hits.push((m.start(), *name));
        }
    }
    hits.sort_by_key(|(start, _)| *start);
    let mut locations: Vec<String> = Vec::new();
    for (_, name) in hits {
        let name = title_case(name);
        if !locations.contains(&name) {
            locations.push(name);
        }
    }
    locations
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn remainder(working: &str, claims: &Claims) -> String {
    let unclaimed: String = working
        .char_indices()
        .map(|(i, c)| if claims.contains(i) { ' ' } else { c })
        .collect();
    unclaimed
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .filter(|w| w.bytes().any(|b| b.is_ascii_alphanumeric()))
        .collect::<Vec<_>>()
        .join(" ")
}
