//! clinicdb-query
//!
//! Heuristic natural-language query parsing ("cheap vaccine in Vancouver") into
//! structured filters, and the deep-link codec used to share a search.

pub mod deep_link;
pub mod lexicon;
pub mod numbers;
pub mod parsed;
pub mod parser;

pub use deep_link::{DeepLink, LinkFilters, LinkKind};
pub use parsed::{Confidence, ParsedQuery, PriceComparison};
pub use parser::QueryParser;
