mod export;
mod runner;
mod summary;

#[cfg(test)]
mod tests;

pub use runner::{run_bench, run_with_fetcher};
