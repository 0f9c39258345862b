//! Search session state: the filter state controller, the coalescing timer
//! for rapid facet edits, and the session that ties them to the engines.

pub mod controller;
pub mod debounce;
pub mod session;

pub use controller::{EditChannel, FacetEdit, FilterStateController};
pub use debounce::Coalescer;
pub use session::{SearchSession, SearchView};
