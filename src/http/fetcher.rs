use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, redirect};
use tokio::time::Instant;

use crate::args::{BenchArgs, DEFAULT_USER_AGENT, StatusPolicy};
use crate::domain::RequestSpec;
use crate::error::{AppError, AppResult, FetchError, HttpError};
use crate::metrics::{SampleOutcome, SampleResult};

/// What one GET produced: status, body length, and wall-clock time from
/// request start to the last body byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body_bytes: u64,
    pub elapsed: Duration,
}

/// Performs a single GET. Implementations must not retry.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// `reqwest`-backed fetcher sharing one connection pool across workers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the HTTP client from the run settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed (e.g. the TLS
    /// backend fails to initialize).
    pub fn new(args: &BenchArgs) -> AppResult<Self> {
        let mut client_builder = Client::builder()
            .timeout(args.request_timeout)
            .connect_timeout(args.connect_timeout)
            .user_agent(DEFAULT_USER_AGENT);

        if args.redirect_limit == 0 {
            client_builder = client_builder.redirect(redirect::Policy::none());
        } else {
            client_builder = client_builder.redirect(redirect::Policy::limited(
                usize::try_from(args.redirect_limit).unwrap_or(10),
            ));
        }

        if args.disable_keepalive {
            client_builder = client_builder
                .pool_max_idle_per_host(0)
                .pool_idle_timeout(Some(Duration::from_secs(0)));
        }

        let client = client_builder
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| classify_error(err, started.elapsed(), false))?;
        let status = response.status().as_u16();
        let body_bytes = drain_response_body(response)
            .await
            .map_err(|err| classify_error(err, started.elapsed(), true))?;
        Ok(FetchResponse {
            status,
            body_bytes,
            elapsed: started.elapsed(),
        })
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}

fn classify_error(err: reqwest::Error, elapsed: Duration, reading_body: bool) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            elapsed,
            source: err,
        }
    } else if reading_body {
        FetchError::Body { source: err }
    } else {
        FetchError::Transport { source: err }
    }
}

/// Executes one spec against `url` and turns the result into an outcome.
/// Non-2xx responses stay samples under [`StatusPolicy::Record`].
pub async fn fetch_sample(
    fetcher: &dyn Fetch,
    spec: RequestSpec,
    url: String,
    status_policy: StatusPolicy,
) -> SampleOutcome {
    match fetcher.fetch(&url).await {
        Ok(response) => {
            let success = (200..300).contains(&response.status);
            if !success && status_policy == StatusPolicy::Fail {
                return SampleOutcome::Failed {
                    spec,
                    url,
                    error: FetchError::UnexpectedStatus {
                        status: response.status,
                    },
                };
            }
            SampleOutcome::Sample(SampleResult {
                spec,
                url,
                status: response.status,
                elapsed: response.elapsed,
                response_bytes: response.body_bytes,
            })
        }
        Err(error) => SampleOutcome::Failed { spec, url, error },
    }
}
