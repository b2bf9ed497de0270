use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::{ok, ready, LocalBoxFuture, Ready};

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, HeaderName, HeaderValue},
};

use crate::api::errors::TodoApiError;

const LIMIT_HEADER: &str = "ratelimit-limit";
const REMAINING_HEADER: &str = "ratelimit-remaining";
const RESET_HEADER: &str = "ratelimit-reset";

/// Past this many tracked clients, expired windows are swept on the next hit
const SWEEP_THRESHOLD: usize = 1024;

struct Window {
    started: Instant,
    hits: u32,
}

/// Outcome of counting one request against a client's window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the window resets
    pub reset: u64,
}

impl Decision {
    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(
            HeaderName::from_static(LIMIT_HEADER),
            HeaderValue::from(self.limit),
        );
        headers.insert(
            HeaderName::from_static(REMAINING_HEADER),
            HeaderValue::from(self.remaining),
        );
        headers.insert(
            HeaderName::from_static(RESET_HEADER),
            HeaderValue::from(self.reset),
        );
    }
}

/// Fixed window request counter keyed by client address.
///
/// Cloning shares the counters, so one limiter built before `HttpServer::new`
/// covers all workers.
#[derive(Clone)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    /// Key on `Forwarded` / `X-Forwarded-For` instead of the socket address
    trust_proxy: bool,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            trust_proxy: false,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Only enable behind a reverse proxy that overwrites the forwarded
    /// headers, clients can set them to anything.
    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    fn client_key(&self, req: &ServiceRequest) -> String {
        if self.trust_proxy {
            if let Some(addr) = req.connection_info().realip_remote_addr() {
                return addr.to_string();
            }
        }

        req.peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| String::from("unknown"))
    }

    pub fn hit(&self, client: &str, now: Instant) -> Decision {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() >= SWEEP_THRESHOLD {
            let span = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < span);
        }

        let window = windows.entry(client.to_string()).or_insert(Window {
            started: now,
            hits: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.hits = 0;
        }

        window.hits = window.hits.saturating_add(1);

        let elapsed = now.duration_since(window.started);
        let reset = self.window.saturating_sub(elapsed).as_secs_f64().ceil() as u64;

        Decision {
            allowed: window.hits <= self.max,
            limit: self.max,
            remaining: self.max.saturating_sub(window.hits),
            reset,
        }
    }
}

pub struct RateLimitMiddleware<S> {
    service: S,
    limiter: RateLimiter,
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;

    type Error = actix_web::Error;

    type InitError = ();

    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddleware {
            service,
            limiter: self.clone(),
        })
    }
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;

    type Error = actix_web::Error;

    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = self.limiter.client_key(&req);
        let decision = self.limiter.hit(&client, Instant::now());

        if !decision.allowed {
            log::warn!("rate limit exceeded for {}", client);

            let mut res = TodoApiError::TooManyRequests.to_response();
            decision.write_headers(res.headers_mut());

            return Box::pin(ready(Ok(req.into_response(res.map_into_right_body()))));
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            decision.write_headers(res.headers_mut());

            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_after_max_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        let first = limiter.hit("1.2.3.4", now);
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.reset, 60);

        assert!(limiter.hit("1.2.3.4", now).allowed);

        let third = limiter.hit("1.2.3.4", now);
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
    }

    #[test]
    fn test_clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.hit("a", now).allowed);
        assert!(limiter.hit("b", now).allowed);
        assert!(!limiter.hit("a", now).allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let now = Instant::now();

        assert!(limiter.hit("a", now).allowed);
        assert!(!limiter.hit("a", now + Duration::from_secs(5)).allowed);
        assert!(limiter.hit("a", now + Duration::from_secs(10)).allowed);
    }

    #[test]
    fn test_clones_share_counters() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let other = limiter.clone();
        let now = Instant::now();

        assert!(limiter.hit("a", now).allowed);
        assert!(!other.hit("a", now).allowed);
    }
}
