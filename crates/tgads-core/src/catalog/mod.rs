//! Channel curation engine: fetch, derive, window, edit, select.

pub mod fetcher;
pub mod mutation;
pub mod pipeline;
pub mod selection;
pub mod session;
pub mod window;

pub use fetcher::{
    FetchOutcome, FetchRequest, FetchState, FetchTicket, Fetcher, RefreshOutcome, TaxonomyFilter,
};
pub use mutation::{EditOutcome, FieldEdit};
pub use pipeline::{derive, DisplayView, SortDir, SortField, SortSpec};
pub use selection::SelectionSet;
pub use session::CurationSession;
pub use window::{RowWindow, ScrollState, Viewport};
