//! URL building, request execution, and bounded-concurrency dispatch.
mod dispatcher;
mod fetcher;
mod url;


pub use dispatcher::{DispatchPlan, DispatchStats, spawn_dispatcher};
pub use fetcher::{Fetch, FetchResponse, HttpFetcher, fetch_sample};
pub use url::{MAX_REQUESTS, build_url, expand_specs, planned_requests};
