pub(crate) const DEFAULT_USER_AGENT: &str = concat!("imgbench/", env!("CARGO_PKG_VERSION"));

/// Worker slots used when neither CLI nor config sets a concurrency.
pub(crate) const DEFAULT_CONCURRENCY: usize = 10;
