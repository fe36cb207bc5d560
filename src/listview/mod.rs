//! Generic list view machinery shared by every entity screen.
//!
//! - `QueryState` holds page, page size, sort, search text and filters
//! - `ResponseCache` memoizes fetched pages for the session, keyed by
//!   namespace plus a digest of the request parameters
//! - `ListViewController` resolves the state against the cache or an
//!   injected fetch capability and drops out-of-order responses

mod cache;
mod controller;
mod params;
mod query_state;
mod storage;

pub use cache::{Page, ResponseCache};
pub use controller::{
  fetch_codes, FetchOptions, FetchPlan, FetchStatus, FetchTicket, ListError, ListViewController,
  PageInfo, PageSource,
};
pub use params::{FieldMap, ListConfig, ListParams};
pub use query_state::{Filters, PageSize, QueryState, SortDirection};
pub use storage::{MemoryStorage, NoopStorage, SqliteStorage};
