use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::StateInformationMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota,
    RateLimiter,
};
use log::warn;

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

pub const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");

type KeyedLimiter = RateLimiter<
    IpAddr,
    DefaultKeyedStateStore<IpAddr>,
    DefaultClock,
    StateInformationMiddleware,
>;

/// Per-client request ceiling for the `/api` routes.
pub struct ApiRateLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
    max: u32,
    window: Duration,
}

impl ApiRateLimiter {
    /// `max` requests per `window`, refilled evenly across the window.
    pub fn new(window: Duration, max: u32) -> Result<Self, String> {
        let burst = NonZeroU32::new(max).ok_or("Rate limit max must be greater than zero")?;
        let quota = Quota::with_period(window / max)
            .ok_or("Rate limit window must be greater than zero")?
            .allow_burst(burst);
        Ok(Self {
            limiter: RateLimiter::keyed(quota).with_middleware::<StateInformationMiddleware>(),
            clock: DefaultClock::default(),
            max,
            window,
        })
    }

    /// `Ok` carries the requests left in the burst, `Err` how long the client should wait.
    pub fn check(&self, client: IpAddr) -> Result<u32, Duration> {
        self.limiter
            .check_key(&client)
            .map(|snapshot| snapshot.remaining_burst_capacity())
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// `RateLimit-Policy`, `RateLimit-Limit` and `RateLimit-Remaining`.
    pub fn standard_headers(&self, remaining: u32) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let policy = format!("{};w={}", self.max, self.window.as_secs());
        if let Ok(value) = HeaderValue::from_str(&policy) {
            headers.insert(RATELIMIT_POLICY, value);
        }
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(self.max));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
        headers
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<ApiRateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    // Routers driven without connect info (tests, in-process calls) share one bucket.
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(client) {
        Ok(remaining) => {
            let mut response = next.run(req).await;
            response.headers_mut().extend(limiter.standard_headers(remaining));
            response
        }
        Err(wait) => {
            warn!("Rate limit exceeded for {} on {}", client, req.uri().path());
            let retry_after = wait.as_secs().max(1).to_string();
            (
                StatusCode::TOO_MANY_REQUESTS,
                limiter.standard_headers(0),
                [(RETRY_AFTER, retry_after)],
                RATE_LIMITED_MESSAGE,
            ).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_burst_then_rejects() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 3).unwrap();
        let client: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(limiter.check(client), Ok(2));
        assert_eq!(limiter.check(client), Ok(1));
        assert_eq!(limiter.check(client), Ok(0));
        let wait = limiter.check(client).unwrap_err();
        assert!(wait <= Duration::from_secs(20));
    }

    #[test]
    fn clients_are_limited_independently() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 1).unwrap();
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check(a).is_ok());
        assert!(limiter.check(a).is_err());
        assert!(limiter.check(b).is_ok());
    }

    #[test]
    fn standard_headers_describe_the_policy() {
        let limiter = ApiRateLimiter::new(Duration::from_secs(60), 30).unwrap();
        let headers = limiter.standard_headers(29);
        assert_eq!(headers[RATELIMIT_POLICY], "30;w=60");
        assert_eq!(headers[RATELIMIT_LIMIT], "30");
        assert_eq!(headers[RATELIMIT_REMAINING], "29");
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(ApiRateLimiter::new(Duration::from_secs(60), 0).is_err());
        assert!(ApiRateLimiter::new(Duration::ZERO, 30).is_err());
    }
}
