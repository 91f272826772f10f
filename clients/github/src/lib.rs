//! GitHub REST API v3 implementation of `contributors::api::Client`.
//!
//! Requests go out one at a time. Every request waits for the rate limit window first,
//! transient failures are retried with exponential backoff and rate limited responses are retried after the window resets.

mod builder;
mod limiter;
mod payload;

pub use builder::GithubClientBuilder;

use async_trait::async_trait;
use chrono::Utc;
use contributors::api::{Client, Contributor, Error, Profile, RepositoryRef, Result};
use derive_more::Constructor;
use log::{error, warn};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Constructor)]
pub struct RetryPolicy {
    /// Tries per request, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for every next one.
    pub backoff: Duration,
    /// Shortest wait after a rate limited response.
    pub min_rate_limit_wait: Duration,
    /// Rate limit waits longer than this fail the request instead.
    pub max_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(
            3,
            Duration::from_secs(1),
            Duration::from_secs(60),
            Duration::from_secs(3600),
        )
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

pub struct GithubClient {
    client: reqwest::Client,
    base_url: Url,
    limiter: limiter::RateLimiter,
    retry: RetryPolicy,
}

/// Failed attempt, either worth another try after the delay or final.
enum Failure {
    Retry(Error, Duration),
    Fatal(Error),
}

impl GithubClient {
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let mut attempt = 0;
        loop {
            self.limiter.wait(url.as_str()).await?;
            let failure = match self.try_get::<T>(&url, attempt).await {
                Ok(body) => return Ok(body),
                Err(failure) => failure,
            };
            attempt += 1;
            match failure {
                Failure::Fatal(err) => return Err(err),
                Failure::Retry(err, _) if attempt >= self.retry.max_attempts => {
                    error!("Giving up on {} after {} attempts", url, attempt);
                    return Err(err);
                }
                Failure::Retry(err, delay) => {
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {} ms",
                        attempt,
                        self.retry.max_attempts,
                        err,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    if let Error::RateLimited { .. } = err {
                        self.limiter.restore().await;
                    }
                }
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &Url, attempt: u32) -> std::result::Result<T, Failure> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => return Err(Failure::Retry(transport(err), self.retry.backoff(attempt))),
        };
        self.limiter.update(response.headers()).await;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|err| {
                if err.is_decode() {
                    Failure::Fatal(transport(err))
                } else {
                    Failure::Retry(transport(err), self.retry.backoff(attempt))
                }
            });
        }
        if limiter::is_rate_limited(status, response.headers()) {
            let delay = limiter::rate_limit_delay(
                response.headers(),
                Utc::now().timestamp(),
                self.retry.min_rate_limit_wait,
            );
            let err = Error::RateLimited {
                url: url.to_string(),
                wait_secs: delay.as_secs(),
            };
            if delay > self.retry.max_rate_limit_wait {
                return Err(Failure::Fatal(err));
            }
            return Err(Failure::Retry(err, delay));
        }
        let err = match status {
            StatusCode::NOT_FOUND => Error::NotFound(url.to_string()),
            status => Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            },
        };
        if status.is_server_error() {
            Err(Failure::Retry(err, self.retry.backoff(attempt)))
        } else {
            Err(Failure::Fatal(err))
        }
    }
}

#[async_trait]
impl Client for GithubClient {
    async fn top_contributors(&self, repo: &RepositoryRef, per_page: u32) -> Result<Vec<Contributor>> {
        let segments = ["repos", repo.owner.as_str(), repo.name.as_str(), "contributors"];
        let mut request_url = endpoint(&self.base_url, &segments)?;
        request_url
            .query_pairs_mut()
            .append_pair("per_page", &per_page.to_string());
        let contributors = self.get::<Vec<payload::Contributor>>(request_url).await?;
        Ok(contributors.into_iter().map(Contributor::from).collect())
    }

    async fn profile(&self, login: &str) -> Result<Profile> {
        let request_url = endpoint(&self.base_url, &["users", login])?;
        let user = self.get::<payload::User>(request_url).await?;
        Ok(Profile::from(user))
    }
}

/// Appends percent-encoded `segments` to the path of `base_url`.
fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Error("API URL cannot be a base URL"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn transport(err: reqwest::Error) -> Error {
    Error::Transport(format!("{:#}", anyhow::Error::new(err)))
}
