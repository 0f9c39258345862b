pub mod filter;
pub mod paginate;
pub mod sort;
pub mod suggest;

pub use filter::{AppliedFilter, FilterEngine, FilterOutcome};
pub use paginate::{Page, Paginator, DEFAULT_PAGE_SIZE};
pub use sort::{compare, sort_records};
pub use suggest::{suggest, Suggestion};
