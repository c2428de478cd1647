use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Cannot summarize empty group '{group}'.")]
    EmptyGroup { group: String },
    #[error("Metrics collector stopped unexpectedly: {source}")]
    CollectorJoin {
        #[source]
        source: tokio::task::JoinError,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
