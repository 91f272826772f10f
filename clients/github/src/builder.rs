use crate::limiter::{RateLimit, RateLimiter};
use crate::payload::RateLimitBody;
use crate::{GithubClient, RetryPolicy};
use anyhow::Context;
use contributors::api::{Error, Result};
use log::{info, warn};
use reqwest::header;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::Client;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use std::time::Duration;
use url::Url;

pub struct GithubClientBuilder {
    client_builder: ClientBuilder,
    github_url: String,
    headers: HeaderMap,
    authenticated: bool,
    retry: RetryPolicy,
}

impl Default for GithubClientBuilder {
    fn default() -> Self {
        let mut headers = HeaderMap::default();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("Blockchain-Contributors-Extractor"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        Self {
            client_builder: ClientBuilder::default().timeout(Duration::from_secs(30)),
            github_url: "https://api.github.com".to_string(),
            headers,
            authenticated: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl GithubClientBuilder {
    pub fn try_with_token(mut self, token: secrecy::SecretString) -> Result<GithubClientBuilder> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .context("API token is not a valid header value")?;
        value.set_sensitive(true);
        self.headers.insert(header::AUTHORIZATION, value);
        self.authenticated = true;
        Ok(self)
    }

    pub fn with_github_url<STR: AsRef<str>>(mut self, url: STR) -> GithubClientBuilder {
        self.github_url = url.as_ref().to_string();
        self
    }

    /// Timeout of a single request, retries not included.
    pub fn with_timeout(mut self, timeout: Duration) -> GithubClientBuilder {
        self.client_builder = self.client_builder.timeout(timeout);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> GithubClientBuilder {
        self.retry = retry;
        self
    }

    /// Builds the client and seeds its rate limiter from `GET /rate_limit`.
    pub async fn build(self) -> Result<GithubClient> {
        let base_url = Url::parse(&self.github_url).with_context(|| format!("Invalid API URL {}", self.github_url))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Error("API URL cannot be a base URL"));
        }
        let client = self.client_builder.default_headers(self.headers).build().map_err(crate::transport)?;
        let limit = match rate_limit(&client, &base_url).await {
            Ok(limit) => limit,
            Err(err) => {
                let limit = RateLimit::fallback(self.authenticated);
                warn!("Failed to read rate limit: {}. Assuming {:?}", err, limit);
                limit
            }
        };
        info!("Starting with rate limit {:?}", limit);
        if !self.authenticated {
            warn!("No API token given. Unauthenticated requests are limited to 60 per hour");
        }
        Ok(GithubClient {
            limiter: RateLimiter::new(limit, self.retry.max_rate_limit_wait),
            client,
            base_url,
            retry: self.retry,
        })
    }
}

async fn rate_limit(client: &Client, base_url: &Url) -> Result<RateLimit> {
    let request_url = crate::endpoint(base_url, &["rate_limit"])?;
    let response = client
        .get(request_url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(crate::transport)?;
    let body = response.json::<RateLimitBody>().await.map_err(crate::transport)?;
    let core = body.resources.core;
    Ok(RateLimit::new(core.limit, core.remaining, core.reset))
}
