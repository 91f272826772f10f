use chrono::Utc;
use contributors::api::{Error, Result};
use derive_more::Constructor;
use log::debug;
use log::info;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::StatusCode;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Constructor, Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    limit: u32,
    remaining: u32,
    /// Epoch second when the window resets.
    reset: i64,
}

impl RateLimit {
    /// Limits assumed when `GET /rate_limit` is not available.
    pub(crate) fn fallback(authenticated: bool) -> Self {
        let limit = if authenticated { 5000 } else { 60 };
        RateLimit::new(limit, limit, 0)
    }

    /// Takes a request from the window. Returns delay to wait first when the window is used up.
    fn time_to_wait(&mut self, now: i64) -> Option<Duration> {
        if self.remaining > 0 {
            debug!("Remaining limit {}. Not waiting.", self.remaining);
            self.remaining -= 1;
            return None;
        }
        if self.reset <= now {
            debug!("Old reset. Resetting remaining to limit.");
            self.restore();
            return None;
        }
        Some(Duration::from_secs((self.reset - now) as u64 + 1))
    }

    fn restore(&mut self) {
        self.remaining = self.limit.saturating_sub(1);
    }
}

pub struct RateLimiter {
    limit: Mutex<RateLimit>,
    max_wait: Duration,
}

impl RateLimiter {
    pub(crate) fn new(limit: RateLimit, max_wait: Duration) -> Self {
        RateLimiter {
            limit: Mutex::new(limit),
            max_wait,
        }
    }

    /// Blocks until a request to `url` fits into the rate limit window.
    pub(crate) async fn wait(&self, url: &str) -> Result<()> {
        let delay = self.limit.lock().await.time_to_wait(Utc::now().timestamp());
        if let Some(delay) = delay {
            if delay > self.max_wait {
                return Err(Error::RateLimited {
                    url: url.to_string(),
                    wait_secs: delay.as_secs(),
                });
            }
            info!("Rate limiting wait: {} sec", delay.as_secs());
            tokio::time::sleep(delay).await;
            self.restore().await;
        }
        Ok(())
    }

    /// Marks the window as renewed after waiting for its reset.
    pub(crate) async fn restore(&self) {
        self.limit.lock().await.restore();
    }

    /// Refreshes limits from `x-ratelimit-*` response headers. Responses without them are ignored.
    pub(crate) async fn update(&self, headers: &HeaderMap<HeaderValue>) {
        let limit = read_header::<u32>(headers, "x-ratelimit-limit");
        let remaining = read_header::<u32>(headers, "x-ratelimit-remaining");
        let reset = read_header::<i64>(headers, "x-ratelimit-reset");
        if let (Some(limit), Some(remaining), Some(reset)) = (limit, remaining, reset) {
            let mut rate_limit = self.limit.lock().await;
            *rate_limit = RateLimit::new(limit, remaining, reset);
            debug!("Updated limits: {:?}", rate_limit);
        }
    }

    #[cfg(test)]
    pub(crate) async fn current(&self) -> RateLimit {
        *self.limit.lock().await
    }
}

/// Whether the response signals an exhausted rate limit rather than missing permissions.
pub(crate) fn is_rate_limited(status: StatusCode, headers: &HeaderMap<HeaderValue>) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => {
            read_header::<u32>(headers, "x-ratelimit-remaining") == Some(0) || headers.contains_key("retry-after")
        }
        _ => false,
    }
}

/// Time to wait before retrying a rate limited request, never shorter than `min_wait`.
pub(crate) fn rate_limit_delay(headers: &HeaderMap<HeaderValue>, now: i64, min_wait: Duration) -> Duration {
    let delay = match read_header::<u64>(headers, "retry-after") {
        Some(retry_after) => Duration::from_secs(retry_after),
        None => read_header::<i64>(headers, "x-ratelimit-reset")
            .map(|reset| Duration::from_secs(std::cmp::max(reset - now, 0) as u64))
            .unwrap_or(min_wait),
    };
    std::cmp::max(delay, min_wait)
}

fn read_header<T: FromStr>(headers: &HeaderMap<HeaderValue>, header: &str) -> Option<T> {
    headers.get(header)?.to_str().ok()?.trim().parse::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn time_to_wait_test() {
        let now = 1_000;
        let mut limit = RateLimit::new(3, 1, now + 10);
        assert_eq!(limit.time_to_wait(now), None, "Limiter should not wait with remaining set to 1");
        assert_eq!(limit.time_to_wait(now), Some(Duration::from_secs(11)), "Limiter should wait till reset");
        assert_eq!(
            limit.time_to_wait(now + 10),
            None,
            "Remaining should be reset after reaching reset time, so no wait."
        );
        assert_eq!(limit, RateLimit::new(3, 2, now + 10));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_test() {
        let reset = Utc::now().timestamp() + 30;
        let limiter = RateLimiter::new(RateLimit::new(2, 0, reset), Duration::from_secs(3600));
        let start = tokio::time::Instant::now();
        limiter.wait("http://localhost").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert_eq!(limiter.current().await, RateLimit::new(2, 1, reset));

        let start = tokio::time::Instant::now();
        limiter.wait("http://localhost").await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn wait_longer_than_max_fails_test() {
        let reset = Utc::now().timestamp() + 600;
        let limiter = RateLimiter::new(RateLimit::new(60, 0, reset), Duration::from_secs(60));
        let result = limiter.wait("http://localhost/users/a").await;
        assert!(matches!(result, Err(Error::RateLimited { .. })));
    }

    #[tokio::test]
    async fn update_test() {
        let limiter = RateLimiter::new(RateLimit::fallback(false), Duration::from_secs(60));
        limiter.update(&headers(&[("x-ratelimit-limit", "5000")])).await;
        assert_eq!(limiter.current().await, RateLimit::new(60, 60, 0), "Partial headers are ignored");

        limiter
            .update(&headers(&[
                ("x-ratelimit-limit", "5000"),
                ("x-ratelimit-remaining", "4999"),
                ("x-ratelimit-reset", "1372700873"),
            ]))
            .await;
        assert_eq!(limiter.current().await, RateLimit::new(5000, 4999, 1372700873));
    }

    #[test]
    fn is_rate_limited_test() {
        let exhausted = headers(&[("x-ratelimit-remaining", "0")]);
        assert!(is_rate_limited(StatusCode::FORBIDDEN, &exhausted));
        assert!(is_rate_limited(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new()));
        assert!(is_rate_limited(StatusCode::FORBIDDEN, &headers(&[("retry-after", "30")])));
        assert!(!is_rate_limited(StatusCode::FORBIDDEN, &headers(&[("x-ratelimit-remaining", "12")])));
        assert!(!is_rate_limited(StatusCode::INTERNAL_SERVER_ERROR, &exhausted));
    }

    #[test]
    fn rate_limit_delay_test() {
        let min = Duration::from_secs(60);
        let now = 1_000;
        assert_eq!(
            rate_limit_delay(&headers(&[("x-ratelimit-reset", "1300")]), now, min),
            Duration::from_secs(300)
        );
        assert_eq!(rate_limit_delay(&headers(&[("x-ratelimit-reset", "1010")]), now, min), min);
        assert_eq!(rate_limit_delay(&headers(&[("x-ratelimit-reset", "900")]), now, Duration::ZERO), Duration::ZERO);
        assert_eq!(
            rate_limit_delay(&headers(&[("retry-after", "120"), ("x-ratelimit-reset", "1300")]), now, min),
            Duration::from_secs(120)
        );
        assert_eq!(rate_limit_delay(&HeaderMap::new(), now, min), min);
    }
}
