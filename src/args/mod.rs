//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::BenchArgs;
pub use types::{GroupBy, OutputFormat, PositiveUsize, StatusPolicy, TemplateArg};

pub(crate) use defaults::{DEFAULT_CONCURRENCY, DEFAULT_USER_AGENT};
#[cfg(test)]
pub(crate) use test_support::parse_test_args;
