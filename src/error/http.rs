use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request dispatcher stopped unexpectedly: {source}")]
    DispatcherJoin {
        #[source]
        source: tokio::task::JoinError,
    },
}
