//! clinicdb-core
//!
//! Domain types shared by the parser, the filter/sort engines and the session
//! layer, plus configuration and the snapshot loader.
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod catalog;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod traits;
pub mod types;

pub use catalog::ServiceCatalog;
pub use types::{
    FilterSpec, NumericRange, PriceFacet, ProviderRecord, SearchField, SearchMode,
    ServiceDefinition, SortKey, TextSearch,
};
