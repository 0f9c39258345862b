//! Fixed vocabularies and patterns the parser matches against.
//!
//! All patterns run on the normalized working text produced by
//! [`crate::numbers::normalize`]: lowercase ASCII, number words already
//! replaced by digits.

use once_cell::sync::Lazy;
use regex::Regex;

use clinicdb_core::types::PriceFacet;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("lexicon pattern must compile")
}

/// Synonym pattern per price facet.
pub static FACET_PATTERNS: Lazy<Vec<(PriceFacet, Regex)>> = Lazy::new(|| {
    vec![
        (
            PriceFacet::Exam,
            compile(r"\b(?:exams?|examinations?|check-?ups?|check ups?|wellness|visits?|consults?|consultations?|physicals?)\b"),
        ),
        (
            PriceFacet::Vaccine,
            compile(r"\b(?:vaccines?|vaccinations?|vaccinate|vax|shots?|immuni[sz]ations?|boosters?)\b"),
        ),
        (PriceFacet::Spay, compile(r"\b(?:spay|spays|spayed|spaying|ovariohysterectomy)\b")),
        (PriceFacet::Neuter, compile(r"\b(?:neuter|neuters|neutered|neutering|castration|castrate)\b")),
    ]
});

const NUM: &str = r"(\d+(?:\.\d+)?)";

/// "between $X and $Y" / "between X to Y".
pub static BETWEEN_RANGE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"\bbetween\s+\$?\s*{NUM}\s*(?:dollars?\s+)?(?:and|to|-)\s*\$?\s*{NUM}")));

/// "from $X to $Y" / "from X-Y".
pub static FROM_RANGE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"\bfrom\s+\$?\s*{NUM}\s*(?:dollars?\s+)?(?:to|-)\s*\$?\s*{NUM}")));

/// "$X-$Y" / "$X to $Y".
pub static DOLLAR_RANGE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"\$\s*{NUM}\s*(?:-|to)\s*\$?\s*{NUM}")));

/// A single amount, optionally with a currency marker on either side.
pub static SINGLE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"(\$\s*)?{NUM}(\s*(?:dollars?|bucks)\b)?")));

/// "4-5 stars" / "4 to 5 star" / "between 4 and 5 stars" / "from 3 to 4 stars".
/// The low end is whichever of groups 1-3 matched; group 4 is the high end.
pub static RATING_RANGE: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"(?:\bbetween\s+{NUM}\s*(?:and|to|-)|\bfrom\s+{NUM}\s*(?:to|-)|{NUM}\s*(?:-|to))\s*{NUM}\s*-?\s*stars?\b"
    ))
});

/// "4 star", "4+ stars", "4.5 stars and above".
pub static RATING_STARS: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"{NUM}\s*\+?\s*-?\s*stars?\b(?:\s+(?:and|or|&)\s+(?:above|up|higher|over|better|more))?"
    ))
});

/// "rated 4+" / "rated 4 and above".
pub static RATED_AT_LEAST: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(r"\brated\s+(?:at\s+least\s+)?{NUM}\s*\+?(?:\s+(?:and|or)\s+(?:above|up|higher|better|more))?"))
});

pub static QUALITY_DESCRIPTOR: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:best|top|highly|highest|great|excellent)\b"));

pub static RATING_KEYWORD: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:rated|rating|ratings|reviews?|reviewed|stars?)\b"));

pub static CHEAP_DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:cheap|cheaper|cheapest|affordable|budget|inexpensive|low-cost|low cost|bargain)\b")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Upper,
    Lower,
}

/// Comparison phrases recognized in the window before an amount.
pub const COMPARISON_KEYWORDS: &[(&str, Bound)] = &[
    ("no more than", Bound::Upper),
    ("not more than", Bound::Upper),
    ("less than", Bound::Upper),
    ("cheaper than", Bound::Upper),
    ("lower than", Bound::Upper),
    ("at most", Bound::Upper),
    ("up to", Bound::Upper),
    ("under", Bound::Upper),
    ("below", Bound::Upper),
    ("within", Bound::Upper),
    ("maximum", Bound::Upper),
    ("max", Bound::Upper),
    ("more than", Bound::Lower),
    ("greater than", Bound::Lower),
    ("higher than", Bound::Lower),
    ("at least", Bound::Lower),
    ("starting at", Bound::Lower),
    ("minimum", Bound::Lower),
    ("min", Bound::Lower),
    ("over", Bound::Lower),
    ("above", Bound::Lower),
];

/// Bytes of working text scanned before an amount for a comparison keyword.
pub const CONTEXT_WINDOW: usize = 24;

/// Provisional "cheap" upper bounds per facet, in dollars.
pub fn default_cheap_threshold(facet: PriceFacet) -> f64 {
    match facet {
        PriceFacet::Exam => 70.0,
        PriceFacet::Vaccine => 50.0,
        PriceFacet::Spay => 400.0,
        PriceFacet::Neuter => 300.0,
    }
}

/// Known locations. Matching order is decided by the parser (longest first),
/// so the order here is irrelevant.
pub const GAZETTEER: &[&str] = &[
    "Vancouver",
    "North Vancouver",
    "West Vancouver",
    "Burnaby",
    "Richmond",
    "Surrey",
    "South Surrey",
    "Coquitlam",
    "Port Coquitlam",
    "Port Moody",
    "New Westminster",
    "Delta",
    "Langley",
    "Maple Ridge",
    "Pitt Meadows",
    "White Rock",
    "Abbotsford",
    "Chilliwack",
    "Squamish",
    "Victoria",
    "Nanaimo",
    "Kelowna",
    "Kamloops",
    "Prince George",
];

/// Gazetteer names paired with their patterns, longest name first.
pub static LOCATION_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    let mut names: Vec<&'static str> = GAZETTEER.to_vec();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names
        .into_iter()
        .map(|name| {
            let words: Vec<String> = name.split_whitespace().map(|w| regex::escape(&w.to_lowercase())).collect();
            (name, compile(&format!(r"\b{}\b", words.join(r"\s+"))))
        })
        .collect()
});

/// Words dropped from the free-text remainder once filters were recognized.
pub const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "in", "at", "near", "for", "with", "of", "to", "on", "me", "my", "i",
    "find", "show", "looking", "need", "want", "clinic", "clinics", "vet", "vets", "veterinary",
    "veterinarian", "veterinarians", "animal", "hospital", "price", "prices", "cost", "costs", "fee",
    "fees", "dollar", "dollars", "bucks", "$", "+", "-", "star", "stars", "rated", "rating", "ratings",
    "best", "top", "highly", "highest", "great", "excellent", "cheap", "cheaper", "cheapest", "affordable",
    "budget", "inexpensive", "low", "bargain", "under", "below", "over", "above", "less", "more", "than",
    "least", "most", "up", "max", "min", "maximum", "minimum", "between", "from", "around", "about",
    "reviews", "review", "reviewed",
];
